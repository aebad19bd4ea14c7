//! Prompt templates.
//!
//! Templates are plain Markdown with `{placeholder}` markers. A `PromptSet` is built
//! once at startup (from the built-in defaults, optionally overridden by a directory
//! of `.md` files) and handed to the decision step and the tools explicitly.

use anyhow::{Context, Result, bail};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

pub const FIXED_DIRECTIVE: &str = "fixed_directive";
pub const GENERATED_DIRECTIVE: &str = "generated_directive";
pub const GUIDED_DIRECTIVE: &str = "guided_directive";
pub const FIXED_EVALUATION: &str = "fixed_evaluation";
pub const OPEN_EVALUATION: &str = "open_evaluation";
pub const DYNAMIC_GENERATION: &str = "dynamic_generation";
pub const HYBRID_GENERATION: &str = "hybrid_generation";
pub const FINAL_JUDGMENT: &str = "final_judgment";

const BUILTIN: [(&str, &str); 8] = [
    (FIXED_DIRECTIVE, include_str!("../../../prompts/fixed_directive.md")),
    (GENERATED_DIRECTIVE, include_str!("../../../prompts/generated_directive.md")),
    (GUIDED_DIRECTIVE, include_str!("../../../prompts/guided_directive.md")),
    (FIXED_EVALUATION, include_str!("../../../prompts/fixed_evaluation.md")),
    (OPEN_EVALUATION, include_str!("../../../prompts/open_evaluation.md")),
    (DYNAMIC_GENERATION, include_str!("../../../prompts/dynamic_generation.md")),
    (HYBRID_GENERATION, include_str!("../../../prompts/hybrid_generation.md")),
    (FINAL_JUDGMENT, include_str!("../../../prompts/final_judgment.md")),
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// A validated collection of named templates.
#[derive(Debug, Clone)]
pub struct PromptSet {
    templates: HashMap<String, String>,
}

impl PromptSet {
    /// The templates shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            templates: BUILTIN
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Builds a set from an explicit map; every required template must be present.
    pub fn from_map(templates: HashMap<String, String>) -> Result<Self> {
        for (key, _) in BUILTIN {
            if !templates.contains_key(key) {
                bail!("Missing prompt template: '{key}'");
            }
        }
        Ok(Self { templates })
    }

    /// Loads every `<name>.md` in `dir` over the built-in defaults.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut set = Self::builtin();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read prompts directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
                let key = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .context("Could not get file stem")?
                    .to_string();
                let content = std::fs::read_to_string(&path)?;
                info!(template = %key, "Overriding built-in prompt template");
                set.templates.insert(key, content);
            }
        }
        Ok(set)
    }

    /// Substitutes `{name}` markers in the named template.
    ///
    /// Markers are expanded in one pass over the template, so braces inside the
    /// substituted values are kept verbatim. Markers without a value stay as they are.
    pub fn render(&self, key: &str, vars: &[(&str, &str)]) -> Result<String> {
        let template = self
            .templates
            .get(key)
            .with_context(|| format!("Missing prompt template: '{key}'"))?;
        let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
            vars.iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        });
        Ok(rendered.into_owned())
    }

    #[cfg(test)]
    pub(crate) fn without(mut self, key: &str) -> Self {
        self.templates.remove(key);
        self
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::builtin()
    }
}
