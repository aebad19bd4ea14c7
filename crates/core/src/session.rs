//! Session State
//!
//! One `SessionState` exists per interview thread. It is the single source of truth
//! between turns: the transcript the model sees, the progress counters, and the
//! evaluation report. Changes are expressed as `SessionUpdate`s whose merge rule is
//! explicit (lists append, scalars replace) so a store never has to overwrite a
//! whole session.

use crate::curriculum::CurriculumItem;
use crate::error::EngineError;
use crate::policy::Variant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Synthetic first human message that prompts the interviewer to open the session.
pub const INITIALIZE_SIGNAL: &str = "INITIALIZE_INTERVIEW_AGENT";

/// A structured request from the decision step naming one registry tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
    pub call_id: String,
}

impl ToolInvocation {
    /// Builds an invocation; non-object `arguments` are treated as no arguments.
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.into(),
            arguments,
            call_id: call_id.into(),
        }
    }
}

/// The answer to one `ToolInvocation`, correlated by `call_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub call_id: String,
    pub result_text: String,
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    Human {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    Tool(ToolResult),
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_calls(calls: Vec<ToolInvocation>) -> Self {
        Self::assistant_with_calls(String::new(), calls)
    }

    /// An assistant message that says something and calls tools in the same step.
    pub fn assistant_with_calls(content: impl Into<String>, calls: Vec<ToolInvocation>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: calls,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, result_text: impl Into<String>) -> Self {
        Message::Tool(ToolResult {
            call_id: call_id.into(),
            result_text: result_text.into(),
        })
    }

    /// Tool invocations carried by an assistant message; empty for everything else.
    pub fn invocations(&self) -> &[ToolInvocation] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// True for the synthetic opening signal, which presentation layers hide.
    pub fn is_initialize_signal(&self) -> bool {
        matches!(self, Message::Human { content } if content == INITIALIZE_SIGNAL)
    }
}

/// Per-answer correctness label extracted from evaluation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    PartiallyCorrect,
    Incorrect,
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Correct => write!(f, "Correct"),
            Verdict::PartiallyCorrect => write!(f, "Partially Correct"),
            Verdict::Incorrect => write!(f, "Incorrect"),
            Verdict::Unknown => write!(f, "Unknown"),
        }
    }
}

/// End-of-session score out of ten, or `Unknown` when the judgment had no rating line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Score(u8),
    Unknown,
}

impl Rating {
    pub fn score(&self) -> Option<u8> {
        match self {
            Rating::Score(s) => Some(*s),
            Rating::Unknown => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Score(s) => write!(f, "{s}/10"),
            Rating::Unknown => write!(f, "unknown"),
        }
    }
}

/// One evaluated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub question: String,
    pub answer: String,
    pub evaluation: String,
    pub verdict: Verdict,
}

/// Complete state of one interview thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub thread_id: String,
    /// Candidate identifier, fixed at creation.
    pub identity: String,
    pub variant: Variant,
    pub curriculum: Vec<CurriculumItem>,
    /// Number of questions evaluated so far; always equal to `report.len()`.
    pub cursor: usize,
    /// Explicit target for generated variants; `None` means "length of the curriculum".
    pub target_count: Option<usize>,
    /// The question awaiting an answer, if any.
    pub active_question: Option<String>,
    pub transcript: Vec<Message>,
    pub report: Vec<ReportEntry>,
    pub finished: bool,
    pub final_rating: Option<Rating>,
    /// Set once the results have been handed to the results sink.
    #[serde(default)]
    pub results_recorded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Creates a session holding only the initialize signal.
    ///
    /// Fixed sessions derive their target from the curriculum and need at least one
    /// question; generated and guided sessions need a positive `target_count`, and
    /// guided sessions also need a curriculum to draw from.
    pub fn new(
        thread_id: impl Into<String>,
        identity: impl Into<String>,
        variant: Variant,
        curriculum: Vec<CurriculumItem>,
        target_count: Option<usize>,
    ) -> Result<Self, EngineError> {
        let thread_id = thread_id.into();
        let identity = identity.into();
        if thread_id.trim().is_empty() {
            return Err(EngineError::InvalidSession("thread id is empty".into()));
        }
        if identity.trim().is_empty() {
            return Err(EngineError::InvalidSession("candidate identity is empty".into()));
        }
        let (curriculum, target_count) = variant
            .normalize(curriculum, target_count)
            .map_err(EngineError::InvalidSession)?;

        let now = Utc::now();
        Ok(Self {
            thread_id,
            identity,
            variant,
            curriculum,
            cursor: 0,
            target_count,
            active_question: None,
            transcript: vec![Message::human(INITIALIZE_SIGNAL)],
            report: Vec::new(),
            finished: false,
            final_rating: None,
            results_recorded: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Number of questions this interview runs for.
    pub fn target(&self) -> usize {
        self.target_count.unwrap_or(self.curriculum.len())
    }

    /// True once `cursor` has reached the target.
    pub fn progress_complete(&self) -> bool {
        self.cursor >= self.target()
    }

    pub fn answer_pending(&self) -> bool {
        self.active_question.is_some()
    }

    pub fn latest_message(&self) -> Option<&Message> {
        self.transcript.last()
    }

    /// Merges a partial update: lists append, scalars replace.
    ///
    /// Monotone fields only ever move forward: `cursor` never decreases, `finished`
    /// never returns to false and `final_rating` is written at most once.
    pub fn apply(&mut self, update: SessionUpdate) {
        self.transcript.extend(update.messages);
        self.report.extend(update.report_entries);
        if let Some(cursor) = update.cursor {
            self.cursor = self.cursor.max(cursor);
        }
        if let Some(active) = update.active_question {
            self.active_question = active;
        }
        if update.finished == Some(true) {
            self.finished = true;
        }
        if let Some(rating) = update.final_rating {
            if self.final_rating.is_none() {
                self.final_rating = Some(rating);
            }
        }
        if update.results_recorded == Some(true) {
            self.results_recorded = true;
        }
        self.updated_at = Utc::now();
    }
}

/// A typed partial update to a `SessionState`.
///
/// `messages` and `report_entries` are appended; every `Some` scalar replaces the
/// stored value, subject to the monotonicity rules of `SessionState::apply`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub messages: Vec<Message>,
    pub report_entries: Vec<ReportEntry>,
    pub cursor: Option<usize>,
    pub active_question: Option<Option<String>>,
    pub finished: Option<bool>,
    pub final_rating: Option<Rating>,
    pub results_recorded: Option<bool>,
}

impl SessionUpdate {
    pub fn append_message(message: Message) -> Self {
        Self {
            messages: vec![message],
            ..Default::default()
        }
    }

    pub fn mark_results_recorded() -> Self {
        Self {
            results_recorded: Some(true),
            ..Default::default()
        }
    }

    /// Folds a later update into this one, keeping append/replace semantics.
    pub fn merge(&mut self, later: SessionUpdate) {
        self.messages.extend(later.messages);
        self.report_entries.extend(later.report_entries);
        self.cursor = later.cursor.or(self.cursor);
        self.active_question = later.active_question.or(self.active_question.take());
        self.finished = later.finished.or(self.finished);
        self.final_rating = later.final_rating.or(self.final_rating);
        self.results_recorded = later.results_recorded.or(self.results_recorded);
    }

    pub fn is_empty(&self) -> bool {
        *self == SessionUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_session() -> SessionState {
        SessionState::new(
            "thread-1",
            "alice",
            Variant::Fixed,
            vec![
                CurriculumItem::new("Q1", "c1"),
                CurriculumItem::new("Q2", "c2"),
            ],
            None,
        )
        .unwrap()
    }

    fn entry(q: &str) -> ReportEntry {
        ReportEntry {
            question: q.into(),
            answer: "a".into(),
            evaluation: "Verdict: Correct".into(),
            verdict: Verdict::Correct,
        }
    }

    #[test]
    fn new_session_starts_with_initialize_signal() {
        let s = fixed_session();
        assert_eq!(s.transcript.len(), 1);
        assert!(s.transcript[0].is_initialize_signal());
        assert_eq!(s.cursor, 0);
        assert_eq!(s.target(), 2);
        assert!(!s.answer_pending());
        assert!(!s.finished);
        assert_eq!(s.final_rating, None);
    }

    #[test]
    fn generated_session_requires_target_count() {
        let err = SessionState::new("t", "bob", Variant::Generated, vec![], None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSession(_)));

        let s = SessionState::new("t", "bob", Variant::Generated, vec![], Some(3)).unwrap();
        assert_eq!(s.target(), 3);
    }

    #[test]
    fn empty_identity_is_rejected() {
        let err = SessionState::new("t", "  ", Variant::Generated, vec![], Some(3)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSession(_)));
    }

    #[test]
    fn apply_appends_lists_and_replaces_scalars() {
        let mut s = fixed_session();
        s.apply(SessionUpdate {
            messages: vec![Message::tool_result("c1", "Q1")],
            active_question: Some(Some("Q1".into())),
            ..Default::default()
        });
        assert_eq!(s.transcript.len(), 2);
        assert_eq!(s.active_question.as_deref(), Some("Q1"));

        s.apply(SessionUpdate {
            report_entries: vec![entry("Q1")],
            cursor: Some(1),
            active_question: Some(None),
            ..Default::default()
        });
        assert_eq!(s.cursor, 1);
        assert_eq!(s.report.len(), 1);
        assert_eq!(s.active_question, None);
        assert_eq!(s.transcript.len(), 2);
    }

    #[test]
    fn apply_keeps_monotone_fields_monotone() {
        let mut s = fixed_session();
        s.apply(SessionUpdate {
            cursor: Some(2),
            finished: Some(true),
            final_rating: Some(Rating::Score(7)),
            ..Default::default()
        });
        s.apply(SessionUpdate {
            cursor: Some(1),
            finished: Some(false),
            final_rating: Some(Rating::Score(2)),
            ..Default::default()
        });
        assert_eq!(s.cursor, 2);
        assert!(s.finished);
        assert_eq!(s.final_rating, Some(Rating::Score(7)));
    }

    #[test]
    fn merge_keeps_later_scalars_and_all_appends() {
        let mut first = SessionUpdate {
            messages: vec![Message::tool_result("a", "one")],
            active_question: Some(Some("Q1".into())),
            ..Default::default()
        };
        first.merge(SessionUpdate {
            messages: vec![Message::tool_result("b", "two")],
            report_entries: vec![entry("Q1")],
            cursor: Some(1),
            active_question: Some(None),
            ..Default::default()
        });
        assert_eq!(first.messages.len(), 2);
        assert_eq!(first.cursor, Some(1));
        assert_eq!(first.active_question, Some(None));
        assert!(!first.is_empty());
        assert!(SessionUpdate::default().is_empty());
    }

    #[test]
    fn tool_invocation_uses_wire_field_names() {
        let call = ToolInvocation::new("call_9", "evaluate_candidate_answer", json!({"user_answer": "42"}));
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(
            value,
            json!({"name": "evaluate_candidate_answer", "arguments": {"user_answer": "42"}, "callId": "call_9"})
        );

        let result = serde_json::to_value(Message::tool_result("call_9", "ok")).unwrap();
        assert_eq!(result, json!({"role": "tool", "callId": "call_9", "resultText": "ok"}));
    }

    #[test]
    fn non_object_arguments_become_empty() {
        let call = ToolInvocation::new("c", "conclude_interview", json!("oops"));
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn rating_and_verdict_display() {
        assert_eq!(Rating::Score(8).to_string(), "8/10");
        assert_eq!(Rating::Unknown.to_string(), "unknown");
        assert_eq!(Rating::Unknown.score(), None);
        assert_eq!(Verdict::PartiallyCorrect.to_string(), "Partially Correct");
    }
}
