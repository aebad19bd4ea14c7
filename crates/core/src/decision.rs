//! Decision Step
//!
//! Stateless wrapper around `LLMClient::decide_action`. It renders the variant's
//! directive, appends a context block describing where the interview stands and
//! which tools are legal right now, and turns the model's choice into the next
//! assistant message. It never touches the session.

use crate::error::EngineError;
use crate::llm_client::{LLMAction, LLMClient};
use crate::prompts::PromptSet;
use crate::router::legal_tools;
use crate::session::{Message, SessionState};
use crate::tools::ToolRegistry;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct DecisionStep {
    client: Arc<dyn LLMClient>,
    prompts: Arc<PromptSet>,
}

impl DecisionStep {
    pub fn new(client: Arc<dyn LLMClient>, prompts: Arc<PromptSet>) -> Self {
        Self { client, prompts }
    }

    /// The directive for this step: the variant template plus the current context.
    pub fn system_prompt(
        &self,
        state: &SessionState,
        registry: &ToolRegistry,
    ) -> Result<String, EngineError> {
        let target = state.target().to_string();
        let directive = self
            .prompts
            .render(
                state.variant.directive_template(),
                &[("question_count", target.as_str()), ("target_count", target.as_str())],
            )
            .map_err(EngineError::Prompt)?;
        Ok(format!("{directive}\n\n{}", context_block(state, registry)))
    }

    /// Asks the model for the next assistant message.
    ///
    /// A model failure is returned as `EngineError::Model`; nothing is retried.
    pub async fn decide(
        &self,
        state: &SessionState,
        registry: &ToolRegistry,
    ) -> Result<Message, EngineError> {
        let system_prompt = self.system_prompt(state, registry)?;
        let tools = registry.definitions();
        debug!(tools = tools.len(), "Requesting decision");

        let action = self
            .client
            .decide_action(&system_prompt, &state.transcript, &tools)
            .await
            .map_err(EngineError::Model)?;

        Ok(match action {
            LLMAction::TextResponse(text) => {
                info!(chars = text.len(), "Decision: reply");
                Message::assistant(text)
            }
            LLMAction::ToolCall { content, calls } => {
                let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
                info!(?names, narrated = !content.is_empty(), "Decision: tool calls");
                Message::assistant_with_calls(content, calls)
            }
        })
    }
}

fn context_block(state: &SessionState, registry: &ToolRegistry) -> String {
    let mut block = String::from("# Current Context for This Turn\n");
    let _ = writeln!(
        block,
        "- Questions evaluated: {} of {}",
        state.cursor,
        state.target()
    );
    match &state.active_question {
        Some(question) => {
            let _ = writeln!(block, "- Question awaiting the candidate's answer: \"{question}\"");
        }
        None => block.push_str("- No question is awaiting an answer.\n"),
    }
    if state.final_rating.is_some() {
        block.push_str("- The overall performance has been judged.\n");
    }

    let legal = legal_tools(state);
    let names: Vec<&str> = registry
        .entries()
        .filter(|(_, kind)| legal.contains(kind))
        .map(|(name, _)| name)
        .collect();
    if names.is_empty() {
        block.push_str("- Legal tool calls now: none; reply to the candidate.\n");
    } else {
        let _ = writeln!(
            block,
            "- Legal tool calls now: {} (or reply to the candidate).",
            names.join(", ")
        );
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::CurriculumItem;
    use crate::llm_client::MockLLMClient;
    use crate::policy::Variant;
    use crate::session::ToolInvocation;
    use serde_json::json;

    fn guided() -> SessionState {
        SessionState::new(
            "t",
            "carol",
            Variant::Guided,
            vec![CurriculumItem::new("What is VLOOKUP?", "lookup")],
            Some(3),
        )
        .unwrap()
    }

    #[test]
    fn system_prompt_carries_target_and_legal_tools() {
        let step = DecisionStep::new(Arc::new(MockLLMClient::new()), Arc::new(PromptSet::builtin()));
        let mut state = guided();
        let registry = ToolRegistry::for_variant(state.variant);

        let prompt = step.system_prompt(&state, &registry).unwrap();
        assert!(prompt.contains("exactly 3 questions"));
        assert!(prompt.contains("Questions evaluated: 0 of 3"));
        assert!(prompt.contains("Legal tool calls now: generate_hybrid_question"));

        state.active_question = Some("Imagine a sheet...".into());
        let prompt = step.system_prompt(&state, &registry).unwrap();
        assert!(prompt.contains("awaiting the candidate's answer: \"Imagine a sheet...\""));
        assert!(prompt.contains("Legal tool calls now: evaluate_candidate_answer"));
    }

    #[tokio::test]
    async fn tool_choice_becomes_an_assistant_message_with_calls() {
        let mut client = MockLLMClient::new();
        client
            .expect_decide_action()
            .withf(|prompt: &str, transcript: &[Message], tools: &[crate::tools::ToolDefinition]| {
                prompt.contains("# Current Context for This Turn")
                    && transcript.len() == 1
                    && tools.len() == 4
            })
            .returning(|_, _, _| {
                Ok(LLMAction::ToolCall {
                    content: "Let me think of a good first question.".to_string(),
                    calls: vec![ToolInvocation::new(
                        "c1",
                        "generate_hybrid_question",
                        json!({"request": "opening"}),
                    )],
                })
            });
        let step = DecisionStep::new(Arc::new(client), Arc::new(PromptSet::builtin()));
        let state = guided();

        let message = step
            .decide(&state, &ToolRegistry::for_variant(state.variant))
            .await
            .unwrap();
        assert_eq!(message.invocations().len(), 1);
        assert_eq!(message.invocations()[0].call_id, "c1");
        assert!(matches!(
            &message,
            Message::Assistant { content, .. } if content == "Let me think of a good first question."
        ));
    }

    #[tokio::test]
    async fn missing_directive_is_a_prompt_error() {
        let mut client = MockLLMClient::new();
        client.expect_decide_action().never();
        let state = guided();
        let prompts = PromptSet::builtin().without(state.variant.directive_template());
        let step = DecisionStep::new(Arc::new(client), Arc::new(prompts));

        let err = step
            .decide(&state, &ToolRegistry::for_variant(state.variant))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Prompt(_)));
    }

    #[tokio::test]
    async fn model_failure_is_reported_as_model_error() {
        let mut client = MockLLMClient::new();
        client
            .expect_decide_action()
            .returning(|_, _, _| Err(anyhow::anyhow!("503 from upstream")));
        let step = DecisionStep::new(Arc::new(client), Arc::new(PromptSet::builtin()));
        let state = guided();

        let err = step
            .decide(&state, &ToolRegistry::for_variant(state.variant))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Model(_)));
    }
}
