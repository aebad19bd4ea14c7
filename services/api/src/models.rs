//! API Models
//!
//! Request and response bodies of the REST API, documented with `utoipa`. Views are
//! built from the engine's `SessionState`; the synthetic initialize signal is never
//! shown.

use chrono::{DateTime, Utc};
use interviewer_core::engine::TurnOutcome;
use interviewer_core::session::{Message as CoreMessage, SessionState};
use interviewer_core::RouterState;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
pub enum SessionStatus {
    Active,
    Ended,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
pub enum MessageRole {
    User,
    Ai,
    Tool,
}

// Implement Display for easy conversion to a string, useful for logging and debugging.
impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Ai => write!(f, "ai"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct Message {
    #[schema(value_type = String, example = "User")]
    pub role: MessageRole,
    pub content: String,
    /// Names of the tools the interviewer called in this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<String>,
}

impl Message {
    /// `None` for the initialize signal.
    pub fn from_core(message: &CoreMessage) -> Option<Self> {
        if message.is_initialize_signal() {
            return None;
        }
        Some(match message {
            CoreMessage::Human { content } => Self {
                role: MessageRole::User,
                content: content.clone(),
                tool_calls: Vec::new(),
            },
            CoreMessage::Assistant {
                content,
                tool_calls,
            } => Self {
                role: MessageRole::Ai,
                content: content.clone(),
                tool_calls: tool_calls.iter().map(|c| c.name.clone()).collect(),
            },
            CoreMessage::Tool(result) => Self {
                role: MessageRole::Tool,
                content: result.result_text.clone(),
                tool_calls: Vec::new(),
            },
        })
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct Session {
    #[schema(example = "5f2b0c1e-7d7e-4c59-9a55-8f1f0c3b2a10")]
    pub id: String,
    pub username: String,
    #[schema(example = "fixed")]
    pub variant: String,
    #[schema(value_type = String, example = "Active")]
    pub status: SessionStatus,
    /// Questions evaluated so far.
    pub questions_evaluated: usize,
    pub target_count: usize,
    pub active_question: Option<String>,
    /// `X/10`, or `unknown` when the judgment had no rating line.
    pub final_rating: Option<String>,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SessionState> for Session {
    fn from(state: &SessionState) -> Self {
        Self {
            id: state.thread_id.clone(),
            username: state.identity.clone(),
            variant: state.variant.to_string(),
            status: if state.finished {
                SessionStatus::Ended
            } else {
                SessionStatus::Active
            },
            questions_evaluated: state.cursor,
            target_count: state.target(),
            active_question: state.active_question.clone(),
            final_rating: state.final_rating.map(|r| r.to_string()),
            messages: state.transcript.iter().filter_map(Message::from_core).collect(),
            created_at: state.created_at,
            updated_at: state.updated_at,
        }
    }
}

/// The outcome of a turn: what the interviewer said and the session afterwards.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct TurnResponse {
    /// Interviewer messages produced during this turn.
    pub replies: Vec<String>,
    /// True once the interview has concluded.
    pub done: bool,
    pub session: Session,
}

impl From<&TurnOutcome> for TurnResponse {
    fn from(outcome: &TurnOutcome) -> Self {
        Self {
            replies: outcome.replies().into_iter().map(String::from).collect(),
            done: outcome.status == RouterState::Done,
            session: Session::from(&outcome.state),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub question: String,
    pub answer: String,
    pub evaluation: String,
    #[schema(example = "Partially Correct")]
    pub verdict: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct Report {
    pub id: String,
    pub username: String,
    pub finished: bool,
    /// Score out of ten; absent until judged or when the judgment had no rating line.
    pub final_rating: Option<u8>,
    pub entries: Vec<ReportEntry>,
}

impl From<&SessionState> for Report {
    fn from(state: &SessionState) -> Self {
        Self {
            id: state.thread_id.clone(),
            username: state.identity.clone(),
            finished: state.finished,
            final_rating: state.final_rating.and_then(|r| r.score()),
            entries: state
                .report
                .iter()
                .map(|e| ReportEntry {
                    question: e.question.clone(),
                    answer: e.answer.clone(),
                    evaluation: e.evaluation.clone(),
                    verdict: e.verdict.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionPayload {
    #[schema(example = "alice")]
    pub username: String,
    /// `fixed`, `generated` or `guided`.
    #[schema(example = "fixed")]
    pub variant: String,
    /// Number of questions for generated and guided interviews.
    pub target_count: Option<usize>,
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessagePayload {
    #[schema(example = "A relative reference shifts when the formula is copied.")]
    pub content: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use interviewer_core::curriculum::CurriculumItem;
    use interviewer_core::session::{Rating, ReportEntry as CoreEntry, ToolInvocation, Verdict};
    use interviewer_core::Variant;
    use serde_json::json;

    fn state() -> SessionState {
        let mut state = SessionState::new(
            "t-1",
            "alice",
            Variant::Fixed,
            vec![CurriculumItem::new("Q1", "c")],
            None,
        )
        .unwrap();
        state.transcript.push(CoreMessage::assistant("Hello!"));
        state.transcript.push(CoreMessage::human("Alice"));
        state.transcript.push(CoreMessage::tool_calls(vec![ToolInvocation::new(
            "c1",
            "ask_static_question",
            json!({}),
        )]));
        state.transcript.push(CoreMessage::tool_result("c1", "Q1"));
        state
    }

    #[test]
    fn test_session_status_serialization() {
        assert_eq!(serde_json::to_string(&SessionStatus::Active).unwrap(), "\"Active\"");
        assert_eq!(serde_json::to_string(&SessionStatus::Ended).unwrap(), "\"Ended\"");
        let ended: SessionStatus = serde_json::from_str("\"Ended\"").unwrap();
        assert_eq!(ended, SessionStatus::Ended);
    }

    #[test]
    fn test_message_role_display() {
        assert_eq!(format!("{}", MessageRole::User), "user");
        assert_eq!(format!("{}", MessageRole::Ai), "ai");
        assert_eq!(format!("{}", MessageRole::Tool), "tool");
    }

    #[test]
    fn test_session_view_hides_initialize_signal() {
        let session = Session::from(&state());
        assert_eq!(session.messages.len(), 4);
        assert_eq!(session.messages[0].role, MessageRole::Ai);
        assert_eq!(session.messages[2].tool_calls, vec!["ask_static_question"]);
        assert_eq!(session.messages[3].role, MessageRole::Tool);
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.target_count, 1);
        assert_eq!(session.final_rating, None);
    }

    #[test]
    fn test_message_serialization_omits_empty_tool_calls() {
        let message = Message {
            role: MessageRole::User,
            content: "Hi".to_string(),
            tool_calls: vec![],
        };
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"role":"User","content":"Hi"}"#);
    }

    #[test]
    fn test_report_view() {
        let mut state = state();
        state.report.push(CoreEntry {
            question: "Q1".into(),
            answer: "A".into(),
            evaluation: "Fine.\nVerdict: Partially Correct".into(),
            verdict: Verdict::PartiallyCorrect,
        });
        state.cursor = 1;
        state.final_rating = Some(Rating::Unknown);
        state.finished = true;

        let report = Report::from(&state);
        assert!(report.finished);
        assert_eq!(report.final_rating, None);
        assert_eq!(report.entries[0].verdict, "Partially Correct");

        let session = Session::from(&state);
        assert_eq!(session.status, SessionStatus::Ended);
        assert_eq!(session.final_rating.as_deref(), Some("unknown"));
    }

    #[test]
    fn test_create_session_payload_deserialization() {
        let payload: CreateSessionPayload =
            serde_json::from_str(r#"{"username": "bob", "variant": "generated", "target_count": 3}"#)
                .unwrap();
        assert_eq!(payload.username, "bob");
        assert_eq!(payload.variant, "generated");
        assert_eq!(payload.target_count, Some(3));

        let payload: CreateSessionPayload =
            serde_json::from_str(r#"{"username": "bob", "variant": "fixed"}"#).unwrap();
        assert_eq!(payload.target_count, None);
    }

    #[test]
    fn test_create_session_payload_missing_field() {
        let result: Result<CreateSessionPayload, _> = serde_json::from_str(r#"{"variant": "fixed"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Session not found".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Session not found"}"#);
    }

    #[test]
    fn test_invalid_enum_deserialization() {
        let result: Result<SessionStatus, _> = serde_json::from_str(r#""Invalid""#);
        assert!(result.is_err());
        let result: Result<MessageRole, _> = serde_json::from_str(r#""InvalidRole""#);
        assert!(result.is_err());
    }
}
