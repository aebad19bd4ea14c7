//! Error types for the interview engine.
//!
//! Only collaborator failures and store misses surface as `Err`. Everything the
//! decision step can correct by itself (unknown tools, out-of-sequence calls,
//! malformed arguments) is reported back to it as ordinary tool result text.

use thiserror::Error;

/// Errors that abort the current turn and are returned to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Session '{0}' already exists")]
    SessionExists(String),

    #[error("Session '{0}' is finished and accepts no further input")]
    SessionFinished(String),

    #[error("Session '{0}' has tool calls from an interrupted turn; resume it first")]
    TurnPending(String),

    #[error("Invalid session configuration: {0}")]
    InvalidSession(String),

    #[error("Turn exceeded the limit of {limit} steps")]
    StepLimitExceeded { limit: usize },

    #[error("Model invocation failed: {0}")]
    Model(#[source] anyhow::Error),

    #[error("Prompt template error: {0}")]
    Prompt(#[source] anyhow::Error),

    #[error("Results persistence failed: {0}")]
    Results(#[source] anyhow::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by a `SessionStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No session stored under '{0}'")]
    NotFound(String),

    #[error("A session is already stored under '{0}'")]
    AlreadyExists(String),

    #[error("'{0}' is not a valid session key")]
    InvalidKey(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl EngineError {
    /// Maps a store miss onto the engine-level `SessionNotFound`.
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::SessionNotFound(id),
            StoreError::AlreadyExists(id) => EngineError::SessionExists(id),
            other => EngineError::Store(other),
        }
    }
}

/// A tool invocation that is legal by name but not at this point of the interview.
///
/// These never leave the dispatcher as errors; their display text becomes the
/// tool result the decision step sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceViolation {
    #[error("The interview has already been concluded.")]
    AlreadyFinished,

    #[error("A question is still awaiting the candidate's answer: \"{0}\"")]
    AnswerPending(String),

    #[error("Evaluation failed: No active question.")]
    NoActiveQuestion,

    #[error(
        "Only {evaluated} of {target} questions have been evaluated; keep interviewing before judging or concluding."
    )]
    ProgressIncomplete { evaluated: usize, target: usize },

    #[error("The overall performance has already been judged.")]
    AlreadyJudged,

    #[error("The overall performance must be judged before the interview is concluded.")]
    NotJudged,
}
