//! Router
//!
//! The control loop's state machine and the table of legal tool kinds. Both are pure
//! functions of `SessionState`, so the same state always routes the same way.

use crate::error::SequenceViolation;
use crate::session::{Message, SessionState};
use crate::tools::ToolKind;
use serde::Serialize;
use std::fmt;

/// Where control goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterState {
    /// The turn ends; the caller must append a human message before the loop resumes.
    AwaitingExternalInput,
    /// The decision step runs next.
    Deciding,
    /// The dispatcher runs the tool calls in the latest message.
    Dispatching,
    /// Terminal: the interview is over.
    Done,
}

impl fmt::Display for RouterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterState::AwaitingExternalInput => write!(f, "awaiting_external_input"),
            RouterState::Deciding => write!(f, "deciding"),
            RouterState::Dispatching => write!(f, "dispatching"),
            RouterState::Done => write!(f, "done"),
        }
    }
}

/// Transition function, evaluated after every append.
///
/// Pending tool calls take precedence over `finished`, so a conclusion that arrives
/// together with other calls is still dispatched and narrated before the session
/// is reported as done.
pub fn route(state: &SessionState) -> RouterState {
    match state.latest_message() {
        Some(Message::Assistant { tool_calls, .. }) if !tool_calls.is_empty() => {
            RouterState::Dispatching
        }
        _ if state.finished => RouterState::Done,
        Some(Message::Human { .. }) | Some(Message::Tool(_)) => RouterState::Deciding,
        Some(Message::Assistant { .. }) | None => RouterState::AwaitingExternalInput,
    }
}

/// Dispatching never ends a turn by itself.
pub fn after_dispatch() -> RouterState {
    RouterState::Deciding
}

/// Checks a tool kind against the current progress.
///
/// `Ok` means the tool may run. A `Conclude` on a finished session is allowed and
/// the tool itself turns it into a no-op.
pub fn check_sequence(kind: ToolKind, state: &SessionState) -> Result<(), SequenceViolation> {
    let incomplete = || SequenceViolation::ProgressIncomplete {
        evaluated: state.cursor,
        target: state.target(),
    };

    match kind {
        ToolKind::NextQuestion => {
            if state.finished {
                return Err(SequenceViolation::AlreadyFinished);
            }
            if let Some(question) = &state.active_question {
                return Err(SequenceViolation::AnswerPending(question.clone()));
            }
        }
        ToolKind::EvaluateAnswer => {
            if state.finished {
                return Err(SequenceViolation::AlreadyFinished);
            }
            if !state.answer_pending() || state.progress_complete() {
                return Err(SequenceViolation::NoActiveQuestion);
            }
        }
        ToolKind::JudgePerformance => {
            if state.finished {
                return Err(SequenceViolation::AlreadyFinished);
            }
            if !state.progress_complete() {
                return Err(incomplete());
            }
            if state.final_rating.is_some() {
                return Err(SequenceViolation::AlreadyJudged);
            }
        }
        ToolKind::Conclude => {
            if state.finished {
                return Ok(());
            }
            if !state.progress_complete() {
                return Err(incomplete());
            }
            if state.final_rating.is_none() {
                return Err(SequenceViolation::NotJudged);
            }
        }
    }
    Ok(())
}

/// Tool kinds worth offering to the decision step right now, in a stable order.
///
/// Once the target is reached the question tool can only answer
/// `NO_MORE_QUESTIONS`, so it is left out even though it is still accepted.
pub fn legal_tools(state: &SessionState) -> Vec<ToolKind> {
    [
        ToolKind::NextQuestion,
        ToolKind::EvaluateAnswer,
        ToolKind::JudgePerformance,
        ToolKind::Conclude,
    ]
    .into_iter()
    .filter(|kind| !(*kind == ToolKind::NextQuestion && state.progress_complete()))
    .filter(|kind| check_sequence(*kind, state).is_ok())
    .collect()
}
