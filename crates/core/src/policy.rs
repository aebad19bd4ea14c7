//! Interview Variant Policy
//!
//! A session's variant decides which question tool is registered, which prompt
//! templates drive the decision step and the tools, and how the question target
//! is computed.

use crate::curriculum::CurriculumItem;
use crate::prompts;
use crate::tools::{
    ASK_STATIC_QUESTION, GENERATE_DYNAMIC_QUESTION, GENERATE_HYBRID_QUESTION,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The interview strategy, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Ask the curriculum questions verbatim, in order.
    Fixed,
    /// Generate every question with the model.
    Generated,
    /// Generate questions using the curriculum as inspiration.
    Guided,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Fixed, Variant::Generated, Variant::Guided];

    /// Wire name of the question tool registered for this variant.
    pub fn question_tool(self) -> &'static str {
        match self {
            Variant::Fixed => ASK_STATIC_QUESTION,
            Variant::Generated => GENERATE_DYNAMIC_QUESTION,
            Variant::Guided => GENERATE_HYBRID_QUESTION,
        }
    }

    pub fn directive_template(self) -> &'static str {
        match self {
            Variant::Fixed => prompts::FIXED_DIRECTIVE,
            Variant::Generated => prompts::GENERATED_DIRECTIVE,
            Variant::Guided => prompts::GUIDED_DIRECTIVE,
        }
    }

    /// Fixed interviews grade against the expected concepts; the others grade openly.
    pub fn evaluation_template(self) -> &'static str {
        match self {
            Variant::Fixed => prompts::FIXED_EVALUATION,
            Variant::Generated | Variant::Guided => prompts::OPEN_EVALUATION,
        }
    }

    /// Template used to generate questions, `None` when questions come from the curriculum.
    pub fn generation_template(self) -> Option<&'static str> {
        match self {
            Variant::Fixed => None,
            Variant::Generated => Some(prompts::DYNAMIC_GENERATION),
            Variant::Guided => Some(prompts::HYBRID_GENERATION),
        }
    }

    /// Validates the creation inputs and returns the curriculum and target to store.
    ///
    /// Fixed sessions store no explicit target (it is the curriculum length);
    /// generated sessions drop any curriculum they were handed.
    pub(crate) fn normalize(
        self,
        curriculum: Vec<CurriculumItem>,
        target_count: Option<usize>,
    ) -> Result<(Vec<CurriculumItem>, Option<usize>), String> {
        match self {
            Variant::Fixed => {
                if curriculum.is_empty() {
                    return Err("a fixed interview needs at least one curriculum question".into());
                }
                Ok((curriculum, None))
            }
            Variant::Generated => match target_count {
                Some(n) if n > 0 => Ok((Vec::new(), Some(n))),
                _ => Err("a generated interview needs a positive target count".into()),
            },
            Variant::Guided => {
                if curriculum.is_empty() {
                    return Err("a guided interview needs a curriculum to draw from".into());
                }
                match target_count {
                    Some(n) if n > 0 => Ok((curriculum, Some(n))),
                    _ => Err("a guided interview needs a positive target count".into()),
                }
            }
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Fixed => write!(f, "fixed"),
            Variant::Generated => write!(f, "generated"),
            Variant::Guided => write!(f, "guided"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "static" => Ok(Variant::Fixed),
            "generated" | "dynamic" => Ok(Variant::Generated),
            "guided" | "hybrid" => Ok(Variant::Guided),
            other => Err(format!("unknown interview variant '{other}'")),
        }
    }
}
