//! Results persistence collaborator.

use crate::policy::Variant;
use crate::session::{Rating, ReportEntry, SessionState};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// What a finished interview hands to the results sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewResult {
    pub thread_id: String,
    pub identity: String,
    pub variant: Variant,
    pub report: Vec<ReportEntry>,
    pub final_rating: Rating,
}

impl InterviewResult {
    /// A session that was concluded without a parsable rating reports `Rating::Unknown`.
    pub fn from_session(state: &SessionState) -> Self {
        Self {
            thread_id: state.thread_id.clone(),
            identity: state.identity.clone(),
            variant: state.variant,
            report: state.report.clone(),
            final_rating: state.final_rating.unwrap_or(Rating::Unknown),
        }
    }
}

/// Receives each finished interview once.
#[async_trait]
pub trait ResultsSink: Send + Sync {
    async fn record(&self, result: InterviewResult) -> Result<()>;
}

/// Keeps results in memory; handy for tests and local runs.
#[derive(Default)]
pub struct InMemoryResults {
    records: Mutex<Vec<InterviewResult>>,
}

impl InMemoryResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<InterviewResult> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl ResultsSink for InMemoryResults {
    async fn record(&self, result: InterviewResult) -> Result<()> {
        self.records.lock().await.push(result);
        Ok(())
    }
}
