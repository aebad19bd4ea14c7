//! Tool Registry
//!
//! The fixed set of capabilities the decision step may invoke. Each session gets a
//! registry built for its variant at construction time: an explicit table from wire
//! name to `ToolKind`. Names that are not in the table are rejected by the
//! dispatcher before anything runs.
//!
//! Tools never touch `SessionState` directly. They read it, may call the model, and
//! return a `ToolOutput` whose `ToolEffect` the dispatcher applies.

use crate::curriculum::render_curriculum;
use crate::llm_client::LLMClient;
use crate::policy::Variant;
use crate::prompts::{FINAL_JUDGMENT, PromptSet};
use crate::session::{Rating, ReportEntry, SessionState, Verdict};
use crate::verdict::{parse_rating, parse_verdict};
use anyhow::Result;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

pub const ASK_STATIC_QUESTION: &str = "ask_static_question";
pub const GENERATE_DYNAMIC_QUESTION: &str = "generate_dynamic_question";
pub const GENERATE_HYBRID_QUESTION: &str = "generate_hybrid_question";
pub const EVALUATE_CANDIDATE_ANSWER: &str = "evaluate_candidate_answer";
pub const JUDGE_INTERVIEW_PERFORMANCE: &str = "judge_interview_performance";
pub const CONCLUDE_INTERVIEW: &str = "conclude_interview";

/// Returned by the question tool once the interview has asked all its questions.
pub const NO_MORE_QUESTIONS: &str = "NO_MORE_QUESTIONS";

const DEFAULT_REQUEST: &str = "Generate the next logical question.";

// --- Argument contracts ---

/// Arguments for the generated question tools.
#[derive(Deserialize, JsonSchema, Debug, Default)]
pub struct GenerateQuestionArgs {
    /// What the interviewer wants from the next question.
    #[schemars(
        description = "What the next question should be like, e.g. 'an opening question on lookups' or 'a harder follow-up'"
    )]
    #[serde(default)]
    pub request: String,
}

/// Arguments for `evaluate_candidate_answer`.
#[derive(Deserialize, JsonSchema, Debug)]
pub struct EvaluateAnswerArgs {
    #[schemars(description = "The candidate's answer, verbatim")]
    pub user_answer: String,
}

/// Tools without parameters still advertise an (empty) object schema.
#[derive(Deserialize, JsonSchema, Debug, Default)]
pub struct NoArgs {}

// --- Registry ---

/// The four capability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    NextQuestion,
    EvaluateAnswer,
    JudgePerformance,
    Conclude,
}

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: Value,
}

/// Name → kind table for one variant.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    variant: Variant,
    entries: BTreeMap<&'static str, ToolKind>,
}

impl ToolRegistry {
    pub fn for_variant(variant: Variant) -> Self {
        let entries = BTreeMap::from([
            (variant.question_tool(), ToolKind::NextQuestion),
            (EVALUATE_CANDIDATE_ANSWER, ToolKind::EvaluateAnswer),
            (JUDGE_INTERVIEW_PERFORMANCE, ToolKind::JudgePerformance),
            (CONCLUDE_INTERVIEW, ToolKind::Conclude),
        ]);
        Self { variant, entries }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn resolve(&self, name: &str) -> Option<ToolKind> {
        self.entries.get(name).copied()
    }

    /// Registered names with their kinds, in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, ToolKind)> + '_ {
        self.entries.iter().map(|(name, kind)| (*name, *kind))
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries()
            .map(|(name, kind)| {
                let (description, parameters) = match kind {
                    ToolKind::NextQuestion => match self.variant {
                        Variant::Fixed => (
                            "Get the next question from the predefined interview list. Returns NO_MORE_QUESTIONS when the list is exhausted.",
                            schema_of::<NoArgs>(),
                        ),
                        Variant::Generated => (
                            "Generate the next practical, scenario-based interview question from the interview so far. Returns NO_MORE_QUESTIONS once the interview has asked all its questions.",
                            schema_of::<GenerateQuestionArgs>(),
                        ),
                        Variant::Guided => (
                            "Generate the next scenario-based interview question inspired by the curriculum. Returns NO_MORE_QUESTIONS once the interview has asked all its questions.",
                            schema_of::<GenerateQuestionArgs>(),
                        ),
                    },
                    ToolKind::EvaluateAnswer => (
                        "Evaluate the candidate's answer to the question currently awaiting an answer.",
                        schema_of::<EvaluateAnswerArgs>(),
                    ),
                    ToolKind::JudgePerformance => (
                        "Produce the overall judgment and final rating once every question has been evaluated.",
                        schema_of::<NoArgs>(),
                    ),
                    ToolKind::Conclude => (
                        "End the interview after the overall performance has been judged.",
                        schema_of::<NoArgs>(),
                    ),
                };
                ToolDefinition {
                    name: name.to_string(),
                    description: description.to_string(),
                    parameters,
                }
            })
            .collect()
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// --- Execution ---

/// The declared state change of a tool run, applied by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEffect {
    None,
    QuestionAsked(String),
    AnswerEvaluated(ReportEntry),
    Judged(Rating),
    Concluded,
}

/// Result text for the transcript plus the effect to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub effect: ToolEffect,
}

impl ToolOutput {
    fn new(text: impl Into<String>, effect: ToolEffect) -> Self {
        Self {
            text: text.into(),
            effect,
        }
    }

    /// A recoverable failure: visible to the model, no state change.
    pub fn failure(text: impl Into<String>) -> Self {
        Self::new(text, ToolEffect::None)
    }
}

/// What tools need besides the session: the model, the templates and sampling settings.
#[derive(Clone)]
pub struct ToolContext {
    pub client: Arc<dyn LLMClient>,
    pub prompts: Arc<PromptSet>,
    pub generation_temperature: f32,
    pub evaluation_temperature: f32,
    pub judgment_temperature: f32,
}

impl ToolKind {
    /// Runs the tool against a read-only view of the session.
    ///
    /// Only model invocation failures are returned as `Err`; everything else is a
    /// `ToolOutput` the model can read.
    pub async fn execute(
        self,
        ctx: &ToolContext,
        state: &SessionState,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<ToolOutput> {
        match self {
            ToolKind::NextQuestion => next_question(ctx, state, name, args).await,
            ToolKind::EvaluateAnswer => evaluate_answer(ctx, state, name, args).await,
            ToolKind::JudgePerformance => judge_performance(ctx, state).await,
            ToolKind::Conclude => Ok(conclude(state)),
        }
    }
}

fn parse_args<T: DeserializeOwned>(name: &str, args: &Map<String, Value>) -> Result<T, ToolOutput> {
    serde_json::from_value(Value::Object(args.clone())).map_err(|e| {
        warn!(tool = %name, error = %e, "Rejected malformed tool arguments");
        ToolOutput::failure(format!("Invalid arguments for '{name}': {e}"))
    })
}

async fn next_question(
    ctx: &ToolContext,
    state: &SessionState,
    name: &str,
    args: &Map<String, Value>,
) -> Result<ToolOutput> {
    if state.progress_complete() {
        info!(cursor = state.cursor, target = state.target(), "Question budget exhausted");
        return Ok(ToolOutput::new(NO_MORE_QUESTIONS, ToolEffect::None));
    }

    let Some(template) = state.variant.generation_template() else {
        return Ok(match state.curriculum.get(state.cursor) {
            Some(item) => ToolOutput::new(
                item.question.clone(),
                ToolEffect::QuestionAsked(item.question.clone()),
            ),
            None => ToolOutput::new(NO_MORE_QUESTIONS, ToolEffect::None),
        });
    };

    let args: GenerateQuestionArgs = match parse_args(name, args) {
        Ok(args) => args,
        Err(failure) => return Ok(failure),
    };
    let request = if args.request.trim().is_empty() {
        DEFAULT_REQUEST
    } else {
        args.request.trim()
    };
    let history = render_history(state);
    let curriculum = render_curriculum(&state.curriculum);
    let prompt = ctx.prompts.render(
        template,
        &[
            ("history", history.as_str()),
            ("request", request),
            ("curriculum", curriculum.as_str()),
        ],
    )?;

    let generated = ctx
        .client
        .complete(&prompt, ctx.generation_temperature)
        .await?;
    let question = generated.trim().trim_matches('"').trim().to_string();

    if question.is_empty() {
        warn!("Question generation returned no text");
        return Ok(ToolOutput::failure(
            "Question generation returned no text; request the question again.",
        ));
    }
    if is_repeat(state, &question) {
        warn!(%question, "Generated question repeats an earlier one");
        return Ok(ToolOutput::failure(format!(
            "Generated question repeats one already asked: \"{question}\". Request a different question."
        )));
    }
    Ok(ToolOutput::new(
        question.clone(),
        ToolEffect::QuestionAsked(question),
    ))
}

async fn evaluate_answer(
    ctx: &ToolContext,
    state: &SessionState,
    name: &str,
    args: &Map<String, Value>,
) -> Result<ToolOutput> {
    let args: EvaluateAnswerArgs = match parse_args(name, args) {
        Ok(args) => args,
        Err(failure) => return Ok(failure),
    };
    let Some(question) = state.active_question.clone() else {
        return Ok(ToolOutput::failure("Evaluation failed: No active question."));
    };

    let prompt = match state.variant {
        Variant::Fixed => {
            let Some(item) = state.curriculum.get(state.cursor) else {
                return Ok(ToolOutput::failure("Evaluation failed: No active question."));
            };
            ctx.prompts.render(
                state.variant.evaluation_template(),
                &[
                    ("question", question.as_str()),
                    ("expected_concepts", item.expected_concepts.as_str()),
                    ("answer", args.user_answer.as_str()),
                ],
            )?
        }
        Variant::Generated | Variant::Guided => ctx.prompts.render(
            state.variant.evaluation_template(),
            &[("question", question.as_str()), ("answer", args.user_answer.as_str())],
        )?,
    };

    let evaluation = ctx
        .client
        .complete(&prompt, ctx.evaluation_temperature)
        .await?;
    let verdict = parse_verdict(&evaluation);
    if verdict == Verdict::Unknown {
        warn!(question_number = state.cursor + 1, "Evaluation had no parsable verdict line");
    }

    Ok(ToolOutput::new(
        evaluation.clone(),
        ToolEffect::AnswerEvaluated(ReportEntry {
            question,
            answer: args.user_answer,
            evaluation,
            verdict,
        }),
    ))
}

async fn judge_performance(ctx: &ToolContext, state: &SessionState) -> Result<ToolOutput> {
    let transcript = render_report(state);
    let prompt = ctx.prompts.render(
        FINAL_JUDGMENT,
        &[("identity", state.identity.as_str()), ("transcript", transcript.as_str())],
    )?;
    let judgment = ctx
        .client
        .complete(&prompt, ctx.judgment_temperature)
        .await?;
    let rating = parse_rating(&judgment);
    if rating == Rating::Unknown {
        warn!("Judgment had no parsable rating line");
    }
    Ok(ToolOutput::new(judgment, ToolEffect::Judged(rating)))
}

fn conclude(state: &SessionState) -> ToolOutput {
    let text = format!("Interview concluded for {}.", state.identity);
    if state.finished {
        ToolOutput::new(text, ToolEffect::None)
    } else {
        ToolOutput::new(text, ToolEffect::Concluded)
    }
}

// --- Rendering helpers ---

fn render_history(state: &SessionState) -> String {
    if state.report.is_empty() {
        return "No questions have been asked yet.".to_string();
    }
    state
        .report
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "Question {n}: {q}\nCandidate's answer: {a}\nVerdict: {v}",
                n = i + 1,
                q = entry.question,
                a = entry.answer,
                v = entry.verdict
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_report(state: &SessionState) -> String {
    if state.report.is_empty() {
        return "(no answers were evaluated)".to_string();
    }
    state
        .report
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "Question {n}: {q}\nCandidate's answer: {a}\nEvaluation: {e}",
                n = i + 1,
                q = entry.question,
                a = entry.answer,
                e = entry.evaluation
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Lowercased, whitespace-collapsed form used to compare questions.
pub fn normalize_question(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_lowercase()
}

fn is_repeat(state: &SessionState, question: &str) -> bool {
    let candidate = normalize_question(question);
    state
        .report
        .iter()
        .any(|entry| normalize_question(&entry.question) == candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::CurriculumItem;
    use crate::llm_client::MockLLMClient;
    use serde_json::json;

    fn ctx(client: MockLLMClient) -> ToolContext {
        ToolContext {
            client: Arc::new(client),
            prompts: Arc::new(PromptSet::builtin()),
            generation_temperature: 0.7,
            evaluation_temperature: 0.0,
            judgment_temperature: 0.7,
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn generated(target: usize) -> SessionState {
        SessionState::new("t", "bob", Variant::Generated, vec![], Some(target)).unwrap()
    }

    #[test]
    fn registry_only_knows_the_variants_question_tool() {
        let fixed = ToolRegistry::for_variant(Variant::Fixed);
        assert_eq!(fixed.resolve(ASK_STATIC_QUESTION), Some(ToolKind::NextQuestion));
        assert_eq!(fixed.resolve(GENERATE_DYNAMIC_QUESTION), None);
        assert_eq!(fixed.resolve("delete_everything"), None);

        let guided = ToolRegistry::for_variant(Variant::Guided);
        assert_eq!(guided.resolve(GENERATE_HYBRID_QUESTION), Some(ToolKind::NextQuestion));
        assert_eq!(guided.resolve(CONCLUDE_INTERVIEW), Some(ToolKind::Conclude));
        assert_eq!(guided.entries().count(), 4);
    }

    #[test]
    fn definitions_expose_argument_schemas() {
        let defs = ToolRegistry::for_variant(Variant::Generated).definitions();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                CONCLUDE_INTERVIEW,
                EVALUATE_CANDIDATE_ANSWER,
                GENERATE_DYNAMIC_QUESTION,
                JUDGE_INTERVIEW_PERFORMANCE
            ]
        );
        let evaluate = defs.iter().find(|d| d.name == EVALUATE_CANDIDATE_ANSWER).unwrap();
        assert!(evaluate.parameters["properties"]["user_answer"].is_object());
        assert_eq!(evaluate.parameters["required"], json!(["user_answer"]));
    }

    #[tokio::test]
    async fn fixed_question_comes_from_curriculum_without_model_call() {
        let mut client = MockLLMClient::new();
        client.expect_complete().never();
        let state = SessionState::new(
            "t",
            "alice",
            Variant::Fixed,
            vec![CurriculumItem::new("First?", "c")],
            None,
        )
        .unwrap();

        let out = ToolKind::NextQuestion
            .execute(&ctx(client), &state, ASK_STATIC_QUESTION, &Map::new())
            .await
            .unwrap();
        assert_eq!(out.text, "First?");
        assert_eq!(out.effect, ToolEffect::QuestionAsked("First?".into()));
    }

    #[tokio::test]
    async fn exhausted_generation_skips_the_model() {
        let mut client = MockLLMClient::new();
        client.expect_complete().never();
        let mut state = generated(1);
        state.cursor = 1;

        let out = ToolKind::NextQuestion
            .execute(&ctx(client), &state, GENERATE_DYNAMIC_QUESTION, &Map::new())
            .await
            .unwrap();
        assert_eq!(out.text, NO_MORE_QUESTIONS);
        assert_eq!(out.effect, ToolEffect::None);
    }

    #[tokio::test]
    async fn generated_question_passes_request_and_history() {
        let mut client = MockLLMClient::new();
        client
            .expect_complete()
            .withf(|prompt: &str, temperature: &f32| {
                prompt.contains("a harder follow-up")
                    && prompt.contains("No questions have been asked yet.")
                    && (*temperature - 0.7).abs() < f32::EPSILON
            })
            .times(1)
            .returning(|_, _| Ok("  \"How would you dedupe a list?\"\n".to_string()));

        let out = ToolKind::NextQuestion
            .execute(
                &ctx(client),
                &generated(3),
                GENERATE_DYNAMIC_QUESTION,
                &args(json!({"request": "a harder follow-up"})),
            )
            .await
            .unwrap();
        assert_eq!(
            out.effect,
            ToolEffect::QuestionAsked("How would you dedupe a list?".into())
        );
    }

    #[tokio::test]
    async fn repeated_generated_question_is_refused() {
        let mut client = MockLLMClient::new();
        client
            .expect_complete()
            .returning(|_, _| Ok("how would you DEDUPE a list".to_string()));
        let mut state = generated(3);
        state.report.push(ReportEntry {
            question: "How would you dedupe a list?".into(),
            answer: "a".into(),
            evaluation: "e".into(),
            verdict: Verdict::Correct,
        });
        state.cursor = 1;

        let out = ToolKind::NextQuestion
            .execute(&ctx(client), &state, GENERATE_DYNAMIC_QUESTION, &Map::new())
            .await
            .unwrap();
        assert_eq!(out.effect, ToolEffect::None);
        assert!(out.text.contains("repeats one already asked"));
    }

    #[tokio::test]
    async fn evaluation_requires_user_answer() {
        let mut client = MockLLMClient::new();
        client.expect_complete().never();
        let mut state = generated(2);
        state.active_question = Some("Q?".into());

        let out = ToolKind::EvaluateAnswer
            .execute(&ctx(client), &state, EVALUATE_CANDIDATE_ANSWER, &Map::new())
            .await
            .unwrap();
        assert_eq!(out.effect, ToolEffect::None);
        assert!(out.text.contains("missing field `user_answer`"));
    }

    #[tokio::test]
    async fn evaluation_grades_at_zero_temperature() {
        let mut client = MockLLMClient::new();
        client
            .expect_complete()
            .withf(|prompt: &str, temperature: &f32| {
                prompt.contains("\"Q?\"") && prompt.contains("\"my answer\"") && *temperature == 0.0
            })
            .returning(|_, _| Ok("Close.\nVerdict: Partially Correct".to_string()));
        let mut state = generated(2);
        state.active_question = Some("Q?".into());

        let out = ToolKind::EvaluateAnswer
            .execute(
                &ctx(client),
                &state,
                EVALUATE_CANDIDATE_ANSWER,
                &args(json!({"user_answer": "my answer"})),
            )
            .await
            .unwrap();
        match out.effect {
            ToolEffect::AnswerEvaluated(entry) => {
                assert_eq!(entry.question, "Q?");
                assert_eq!(entry.answer, "my answer");
                assert_eq!(entry.verdict, Verdict::PartiallyCorrect);
            }
            other => panic!("Expected AnswerEvaluated, got {other:?}"),
        }
    }

    fn guided(target: usize) -> SessionState {
        SessionState::new(
            "t",
            "carol",
            Variant::Guided,
            vec![
                CurriculumItem::new("What does VLOOKUP do?", "vertical lookup, first column"),
                CurriculumItem::new("What is a pivot table?", "summarise, group"),
            ],
            Some(target),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn guided_question_is_inspired_by_the_curriculum() {
        let mut client = MockLLMClient::new();
        client
            .expect_complete()
            .withf(|prompt: &str, _: &f32| {
                prompt.contains("Foundational curriculum:")
                    && prompt.contains("1. What does VLOOKUP do? (concepts: vertical lookup, first column)")
                    && prompt.contains("2. What is a pivot table? (concepts: summarise, group)")
                    && prompt.contains("\"an opening question\"")
            })
            .times(1)
            .returning(|_, _| Ok("Your manager sends two sheets keyed by order id. How do you join them?".to_string()));

        let out = ToolKind::NextQuestion
            .execute(
                &ctx(client),
                &guided(3),
                GENERATE_HYBRID_QUESTION,
                &args(json!({"request": "an opening question"})),
            )
            .await
            .unwrap();
        assert_eq!(
            out.effect,
            ToolEffect::QuestionAsked(
                "Your manager sends two sheets keyed by order id. How do you join them?".into()
            )
        );
    }

    #[tokio::test]
    async fn guided_evaluation_grades_without_expected_concepts() {
        let mut client = MockLLMClient::new();
        client
            .expect_complete()
            .withf(|prompt: &str, _: &f32| {
                prompt.contains("using your own expert knowledge")
                    && !prompt.contains("Expected concepts")
                    && !prompt.contains("vertical lookup")
                    && prompt.contains("\"XLOOKUP on the id column.\"")
            })
            .times(1)
            .returning(|_, _| Ok("Good join strategy.\nVerdict: Correct".to_string()));
        let mut state = guided(2);
        state.active_question = Some("How do you join two sheets by order id?".into());

        let out = ToolKind::EvaluateAnswer
            .execute(
                &ctx(client),
                &state,
                EVALUATE_CANDIDATE_ANSWER,
                &args(json!({"user_answer": "XLOOKUP on the id column."})),
            )
            .await
            .unwrap();
        assert!(matches!(
            out.effect,
            ToolEffect::AnswerEvaluated(ReportEntry { verdict: Verdict::Correct, .. })
        ));
    }

    #[tokio::test]
    async fn fixed_evaluation_includes_expected_concepts() {
        let mut client = MockLLMClient::new();
        client
            .expect_complete()
            .withf(|prompt: &str, _: &f32| {
                prompt.contains("Expected concepts: \"vertical lookup, first column\"")
                    && prompt.contains("\"What does VLOOKUP do?\"")
            })
            .times(1)
            .returning(|_, _| Ok("Verdict: Correct".to_string()));
        let mut state = SessionState::new(
            "t",
            "alice",
            Variant::Fixed,
            vec![CurriculumItem::new("What does VLOOKUP do?", "vertical lookup, first column")],
            None,
        )
        .unwrap();
        state.active_question = Some("What does VLOOKUP do?".into());

        let out = ToolKind::EvaluateAnswer
            .execute(
                &ctx(client),
                &state,
                EVALUATE_CANDIDATE_ANSWER,
                &args(json!({"user_answer": "Finds a key in the first column."})),
            )
            .await
            .unwrap();
        assert!(matches!(out.effect, ToolEffect::AnswerEvaluated(_)));
    }

    #[tokio::test]
    async fn judgment_without_rating_line_records_unknown() {
        let mut client = MockLLMClient::new();
        client
            .expect_complete()
            .returning(|_, _| Ok("A fine candidate overall.".to_string()));

        let out = ToolKind::JudgePerformance
            .execute(&ctx(client), &generated(1), JUDGE_INTERVIEW_PERFORMANCE, &Map::new())
            .await
            .unwrap();
        assert_eq!(out.effect, ToolEffect::Judged(Rating::Unknown));
    }

    #[test]
    fn conclude_is_a_no_op_once_finished() {
        let mut state = generated(1);
        assert_eq!(conclude(&state).effect, ToolEffect::Concluded);
        state.finished = true;
        let out = conclude(&state);
        assert_eq!(out.effect, ToolEffect::None);
        assert_eq!(out.text, "Interview concluded for bob.");
    }

    #[test]
    fn normalize_question_ignores_case_spacing_and_trailing_punctuation() {
        assert_eq!(
            normalize_question("  How   would you\nDedupe a list? "),
            "how would you dedupe a list"
        );
    }
}
