//! Tool Dispatcher
//!
//! Runs the tool calls of one assistant message, in order, against a working copy
//! of the session. Every call gets exactly one result message. State changes come
//! only from the `ToolEffect` a tool declares, so an unknown name, an out-of-sequence
//! call or malformed arguments change nothing but the transcript.

use crate::error::EngineError;
use crate::router::check_sequence;
use crate::session::{Message, SessionState, SessionUpdate, ToolInvocation};
use crate::tools::{ToolContext, ToolEffect, ToolRegistry};
use tracing::{info, warn};

#[derive(Clone)]
pub struct ToolDispatcher {
    ctx: ToolContext,
}

impl ToolDispatcher {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Executes `calls` and returns the merged update for the store.
    ///
    /// Each call sees the effects of the calls before it. If a model invocation
    /// fails, the whole batch is abandoned and nothing is returned, so the caller
    /// can retry from the unchanged state.
    pub async fn dispatch(
        &self,
        state: &SessionState,
        registry: &ToolRegistry,
        calls: &[ToolInvocation],
    ) -> Result<SessionUpdate, EngineError> {
        let mut working = state.clone();
        let mut update = SessionUpdate::default();

        for call in calls {
            let step = self.dispatch_one(&working, registry, call).await?;
            working.apply(step.clone());
            update.merge(step);
        }
        Ok(update)
    }

    async fn dispatch_one(
        &self,
        state: &SessionState,
        registry: &ToolRegistry,
        call: &ToolInvocation,
    ) -> Result<SessionUpdate, EngineError> {
        let Some(kind) = registry.resolve(&call.name) else {
            warn!(tool = %call.name, call_id = %call.call_id, "Unknown tool requested");
            return Ok(SessionUpdate::append_message(Message::tool_result(
                &call.call_id,
                format!("Unknown tool '{}' called.", call.name),
            )));
        };

        if let Err(violation) = check_sequence(kind, state) {
            warn!(tool = %call.name, %violation, "Tool call out of sequence");
            return Ok(SessionUpdate::append_message(Message::tool_result(
                &call.call_id,
                violation.to_string(),
            )));
        }

        info!(tool = %call.name, call_id = %call.call_id, "Executing tool");
        let output = kind
            .execute(&self.ctx, state, &call.name, &call.arguments)
            .await
            .map_err(EngineError::Model)?;

        let mut update = effect_update(state, output.effect);
        update
            .messages
            .push(Message::tool_result(&call.call_id, output.text));
        Ok(update)
    }
}

/// Translates a declared effect into the fields it is allowed to touch.
fn effect_update(state: &SessionState, effect: ToolEffect) -> SessionUpdate {
    match effect {
        ToolEffect::None => SessionUpdate::default(),
        ToolEffect::QuestionAsked(question) => SessionUpdate {
            active_question: Some(Some(question)),
            ..Default::default()
        },
        ToolEffect::AnswerEvaluated(entry) => {
            info!(
                question_number = state.cursor + 1,
                verdict = %entry.verdict,
                "Answer evaluated"
            );
            SessionUpdate {
                report_entries: vec![entry],
                cursor: Some(state.cursor + 1),
                active_question: Some(None),
                ..Default::default()
            }
        }
        ToolEffect::Judged(rating) => {
            info!(%rating, "Performance judged");
            SessionUpdate {
                final_rating: Some(rating),
                ..Default::default()
            }
        }
        ToolEffect::Concluded => {
            info!(identity = %state.identity, "Interview concluded");
            SessionUpdate {
                finished: Some(true),
                ..Default::default()
            }
        }
    }
}
