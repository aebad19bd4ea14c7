//! Question Bank
//!
//! This module provides the curriculum a session is created with: an ordered list of
//! questions, each paired with the concepts a good answer should cover. Fixed
//! interviews ask these verbatim, guided interviews use them as inspiration for
//! generated questions, and generated interviews ignore them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single curriculum entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CurriculumItem {
    pub question: String,
    /// Free-text description of what a correct answer should mention.
    #[serde(default)]
    pub expected_concepts: String,
}

impl CurriculumItem {
    pub fn new(question: impl Into<String>, expected_concepts: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            expected_concepts: expected_concepts.into(),
        }
    }
}

/// Defines the contract for any source of interview questions.
///
/// The bank is read once when a session is created; the session keeps its own copy
/// so later edits to the bank never change an interview already in progress.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Returns the ordered curriculum.
    async fn load(&self) -> Result<Vec<CurriculumItem>>;
}

/// A `QuestionBank` backed by a JSON file holding an array of
/// `{ "question": ..., "expected_concepts": ... }` objects.
pub struct JsonQuestionBank {
    path: PathBuf,
}

impl JsonQuestionBank {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl QuestionBank for JsonQuestionBank {
    async fn load(&self) -> Result<Vec<CurriculumItem>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read question bank {}", self.path.display()))?;
        let items: Vec<CurriculumItem> = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed question bank {}", self.path.display()))?;
        Ok(items
            .into_iter()
            .filter(|item| !item.question.trim().is_empty())
            .collect())
    }
}

/// An in-memory `QuestionBank` with a fixed list, for tests and local runs.
pub struct StaticQuestionBank(pub Vec<CurriculumItem>);

#[async_trait]
impl QuestionBank for StaticQuestionBank {
    async fn load(&self) -> Result<Vec<CurriculumItem>> {
        Ok(self.0.clone())
    }
}

/// Renders the curriculum as a numbered list for prompt templates.
pub fn render_curriculum(items: &[CurriculumItem]) -> String {
    if items.is_empty() {
        return "(no curriculum provided)".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if item.expected_concepts.is_empty() {
                format!("{}. {}", i + 1, item.question)
            } else {
                format!(
                    "{}. {} (concepts: {})",
                    i + 1,
                    item.question,
                    item.expected_concepts
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
