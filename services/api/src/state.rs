//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the engine and the
//! services handlers need around it.

use crate::config::Config;
use interviewer_core::{InterviewEngine, curriculum::QuestionBank};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InterviewEngine>,
    /// Source of the curriculum for fixed and guided interviews.
    pub question_bank: Arc<dyn QuestionBank>,
    pub config: Arc<Config>,
}
