use crate::session::{Message, ToolInvocation};
use crate::tools::ToolDefinition;
use anyhow::{Context, Result, anyhow};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolChoiceOption,
        ChatCompletionToolType, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
        FunctionCall, FunctionObjectArgs,
    },
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Represents the two possible outcomes of the LLM's decision-making turn.
#[derive(Debug, Clone, PartialEq)]
pub enum LLMAction {
    /// The LLM decided to respond directly with text.
    TextResponse(String),
    /// The LLM decided to call one or more tools, optionally saying something first.
    ToolCall {
        content: String,
        calls: Vec<ToolInvocation>,
    },
}

/// A generic client for interacting with an LLM.
///
/// Calls are never retried here; a failure is reported to the caller as is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Makes a single, non-streaming call to decide on the next action given the
    /// full transcript.
    async fn decide_action(
        &self,
        system_prompt: &str,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LLMAction>;

    /// Makes a single prompt-in, text-out call.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The specific model identifier to use for chat completions (e.g., "gpt-4o").
    /// * `temperature` - Sampling temperature for `decide_action`.
    pub fn new(config: OpenAIConfig, model: String, temperature: f32) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            temperature,
        }
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn decide_action(
        &self,
        system_prompt: &str,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LLMAction> {
        let messages = to_request_messages(system_prompt, transcript)?;
        let tools = tools
            .iter()
            .map(to_request_tool)
            .collect::<Result<Vec<_>>>()?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if !tools.is_empty() {
            request
                .tools(tools)
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }
        let request = request.build()?;

        let response: CreateChatCompletionResponse = self.client.chat().create(request).await?;
        let choice = response
            .choices
            .first()
            .context("No response choice from LLM")?;

        if let Some(tool_calls) = choice.message.tool_calls.as_ref().filter(|c| !c.is_empty()) {
            Ok(LLMAction::ToolCall {
                content: choice.message.content.clone().unwrap_or_default(),
                calls: tool_calls.iter().map(from_wire_call).collect(),
            })
        } else if let Some(content) = &choice.message.content {
            Ok(LLMAction::TextResponse(content.clone()))
        } else {
            Err(anyhow!(
                "LLM response had neither text content nor tool calls."
            ))
        }
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(temperature)
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt.to_string())
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .as_ref()
            .context("No content in LLM response")?;
        Ok(answer.clone())
    }
}

/// Builds the chat history: the system prompt followed by the transcript.
fn to_request_messages(
    system_prompt: &str,
    transcript: &[Message],
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt.to_string())
            .build()?
            .into(),
    ];
    for msg in transcript {
        match msg {
            Message::Human { content } => messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(content.clone())
                    .build()?
                    .into(),
            ),
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                if !content.is_empty() {
                    builder.content(content.clone());
                }
                if !tool_calls.is_empty() {
                    builder.tool_calls(tool_calls.iter().map(to_wire_call).collect::<Vec<_>>());
                }
                messages.push(builder.build()?.into());
            }
            Message::Tool(result) => messages.push(
                ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(result.call_id.clone())
                    .content(result.result_text.clone())
                    .build()?
                    .into(),
            ),
        }
    }
    Ok(messages)
}

fn to_request_tool(def: &ToolDefinition) -> Result<ChatCompletionTool> {
    Ok(ChatCompletionToolArgs::default()
        .function(
            FunctionObjectArgs::default()
                .name(def.name.clone())
                .description(def.description.clone())
                .parameters(def.parameters.clone())
                .build()?,
        )
        .build()?)
}

fn to_wire_call(call: &ToolInvocation) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.call_id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.name.clone(),
            arguments: Value::Object(call.arguments.clone()).to_string(),
        },
    }
}

/// Unparsable argument JSON is kept as an empty map; the dispatcher then reports
/// the missing arguments back to the model.
fn from_wire_call(call: &ChatCompletionMessageToolCall) -> ToolInvocation {
    let arguments = if call.function.arguments.trim().is_empty() {
        Map::new()
    } else {
        serde_json::from_str::<Map<String, Value>>(&call.function.arguments).unwrap_or_else(|e| {
            warn!(tool = %call.function.name, error = %e, "Tool call arguments were not a JSON object");
            Map::new()
        })
    };
    ToolInvocation {
        name: call.function.name.clone(),
        arguments,
        call_id: call.id.clone(),
    }
}

/// A scripted `LLMClient` for development and integration testing.
///
/// Decisions and completions are served in the order they were queued; running out
/// of script is reported as a model failure. Every prompt received is recorded so
/// tests can assert on what the engine asked for.
#[derive(Default)]
pub struct ScriptedClient {
    actions: Mutex<VecDeque<Result<LLMAction, String>>>,
    completions: Mutex<VecDeque<Result<String, String>>>,
    system_prompts: Mutex<Vec<String>>,
    completion_prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a plain assistant reply.
    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.push_action(Ok(LLMAction::TextResponse(text.into())));
        self
    }

    /// Queues an assistant message carrying a single tool call.
    pub fn then_call(self, call_id: &str, name: &str, arguments: Value) -> Self {
        self.then_calls(vec![ToolInvocation::new(call_id, name, arguments)])
    }

    /// Queues an assistant message carrying several tool calls.
    pub fn then_calls(self, calls: Vec<ToolInvocation>) -> Self {
        self.push_action(Ok(LLMAction::ToolCall {
            content: String::new(),
            calls,
        }));
        self
    }

    /// Queues an assistant message with text for the candidate and a single tool call.
    pub fn then_say_and_call(
        self,
        text: impl Into<String>,
        call_id: &str,
        name: &str,
        arguments: Value,
    ) -> Self {
        self.push_action(Ok(LLMAction::ToolCall {
            content: text.into(),
            calls: vec![ToolInvocation::new(call_id, name, arguments)],
        }));
        self
    }

    /// Queues a failing decision.
    pub fn then_decision_fails(self, message: impl Into<String>) -> Self {
        self.push_action(Err(message.into()));
        self
    }

    /// Queues the text returned by the next `complete` call.
    pub fn then_complete(self, text: impl Into<String>) -> Self {
        lock(&self.completions).push_back(Ok(text.into()));
        self
    }

    /// Queues a failing `complete` call.
    pub fn then_completion_fails(self, message: impl Into<String>) -> Self {
        lock(&self.completions).push_back(Err(message.into()));
        self
    }

    fn push_action(&self, action: Result<LLMAction, String>) {
        lock(&self.actions).push_back(action);
    }

    /// System prompts passed to `decide_action`, in call order.
    pub fn system_prompts(&self) -> Vec<String> {
        lock(&self.system_prompts).clone()
    }

    /// Prompts passed to `complete`, in call order.
    pub fn completion_prompts(&self) -> Vec<String> {
        lock(&self.completion_prompts).clone()
    }

    /// Number of queued decisions and completions not yet consumed.
    pub fn remaining(&self) -> (usize, usize) {
        (lock(&self.actions).len(), lock(&self.completions).len())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl LLMClient for ScriptedClient {
    async fn decide_action(
        &self,
        system_prompt: &str,
        _transcript: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<LLMAction> {
        lock(&self.system_prompts).push(system_prompt.to_string());
        match lock(&self.actions).pop_front() {
            Some(Ok(action)) => Ok(action),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("Scripted client has no decision left")),
        }
    }

    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
        lock(&self.completion_prompts).push(prompt.to_string());
        match lock(&self.completions).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("Scripted client has no completion left")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transcript_maps_onto_chat_roles() {
        let transcript = vec![
            Message::human("hi"),
            Message::tool_calls(vec![ToolInvocation::new(
                "call_1",
                "evaluate_candidate_answer",
                json!({"user_answer": "42"}),
            )]),
            Message::tool_result("call_1", "Verdict: Correct"),
            Message::assistant("Next question."),
        ];
        let messages = to_request_messages("directive", &transcript).unwrap();
        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        match &messages[2] {
            ChatCompletionRequestMessage::Assistant(a) => {
                let calls = a.tool_calls.as_ref().unwrap();
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[0].function.arguments, r#"{"user_answer":"42"}"#);
            }
            other => panic!("Expected assistant message, got {other:?}"),
        }
        match &messages[3] {
            ChatCompletionRequestMessage::Tool(t) => assert_eq!(t.tool_call_id, "call_1"),
            other => panic!("Expected tool message, got {other:?}"),
        }
    }

    #[test]
    fn wire_calls_round_trip_and_tolerate_bad_json() {
        let call = ToolInvocation::new("c9", "generate_dynamic_question", json!({"request": "x"}));
        assert_eq!(from_wire_call(&to_wire_call(&call)), call);

        let broken = ChatCompletionMessageToolCall {
            id: "c10".into(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: "evaluate_candidate_answer".into(),
                arguments: "{not json".into(),
            },
        };
        let parsed = from_wire_call(&broken);
        assert_eq!(parsed.call_id, "c10");
        assert!(parsed.arguments.is_empty());
    }

    #[tokio::test]
    async fn scripted_client_serves_in_order_then_fails() {
        let client = ScriptedClient::new()
            .then_reply("hello")
            .then_call("c1", "ask_static_question", json!({}))
            .then_say_and_call("One moment.", "c2", "ask_static_question", json!({}))
            .then_complete("Verdict: Correct");

        assert_eq!(
            client.decide_action("p1", &[], &[]).await.unwrap(),
            LLMAction::TextResponse("hello".into())
        );
        assert!(matches!(
            client.decide_action("p2", &[], &[]).await.unwrap(),
            LLMAction::ToolCall { content, calls } if content.is_empty() && calls[0].name == "ask_static_question"
        ));
        assert!(matches!(
            client.decide_action("p3", &[], &[]).await.unwrap(),
            LLMAction::ToolCall { content, calls } if content == "One moment." && calls[0].call_id == "c2"
        ));
        assert!(client.decide_action("p4", &[], &[]).await.is_err());
        assert_eq!(client.complete("grade", 0.0).await.unwrap(), "Verdict: Correct");
        assert_eq!(client.system_prompts(), vec!["p1", "p2", "p3", "p4"]);
        assert_eq!(client.completion_prompts(), vec!["grade"]);
        assert_eq!(client.remaining(), (0, 0));
    }
}
