//! Interview Engine
//!
//! Drives one turn of one session: route, decide, dispatch, repeat, until the router
//! suspends. Every step is written to the store before the next one starts, so a
//! turn that aborts leaves a consistent session that `resume` can pick up.
//!
//! Turns on the same thread are serialised by a per-session lock; different threads
//! run concurrently. A lock lives only while some turn holds or awaits it.

use crate::curriculum::CurriculumItem;
use crate::decision::DecisionStep;
use crate::dispatcher::ToolDispatcher;
use crate::error::EngineError;
use crate::llm_client::LLMClient;
use crate::policy::Variant;
use crate::prompts::PromptSet;
use crate::results::{InterviewResult, ResultsSink};
use crate::router::{RouterState, after_dispatch, route};
use crate::session::{Message, SessionState, SessionUpdate};
use crate::store::SessionStore;
use crate::tools::{ToolContext, ToolRegistry};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, instrument};

/// Sampling and safety settings for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub generation_temperature: f32,
    /// Grading runs at zero temperature unless overridden.
    pub evaluation_temperature: f32,
    pub judgment_temperature: f32,
    /// Decision plus dispatch steps allowed in one turn.
    pub max_steps_per_turn: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            generation_temperature: 0.7,
            evaluation_temperature: 0.0,
            judgment_temperature: 0.7,
            max_steps_per_turn: 24,
        }
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub thread_id: String,
    pub identity: String,
    pub variant: Variant,
    pub curriculum: Vec<CurriculumItem>,
    pub target_count: Option<usize>,
}

/// The result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Either `AwaitingExternalInput` or `Done`.
    pub status: RouterState,
    /// Messages the engine appended during the turn, in order.
    pub new_messages: Vec<Message>,
    pub state: SessionState,
}

impl TurnOutcome {
    /// Assistant texts produced during the turn, for display to the candidate.
    pub fn replies(&self) -> Vec<&str> {
        self.new_messages
            .iter()
            .filter_map(|m| match m {
                Message::Assistant { content, .. } if !content.is_empty() => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub struct InterviewEngine {
    store: Arc<dyn SessionStore>,
    results: Arc<dyn ResultsSink>,
    decision: DecisionStep,
    dispatcher: ToolDispatcher,
    settings: EngineSettings,
    locks: LockTable,
}

type LockTable = std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>;

/// Holds a session's turn lock; the table entry is dropped with the last holder.
struct TurnLock<'a> {
    table: &'a LockTable,
    thread_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for TurnLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table
            .get(&self.thread_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.thread_id);
        }
    }
}

impl InterviewEngine {
    pub fn new(
        client: Arc<dyn LLMClient>,
        prompts: Arc<PromptSet>,
        store: Arc<dyn SessionStore>,
        results: Arc<dyn ResultsSink>,
        settings: EngineSettings,
    ) -> Self {
        let ctx = ToolContext {
            client: client.clone(),
            prompts: prompts.clone(),
            generation_temperature: settings.generation_temperature,
            evaluation_temperature: settings.evaluation_temperature,
            judgment_temperature: settings.judgment_temperature,
        };
        Self {
            store,
            results,
            decision: DecisionStep::new(client, prompts),
            dispatcher: ToolDispatcher::new(ctx),
            settings,
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    async fn lock_turn(&self, thread_id: &str) -> TurnLock<'_> {
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(thread_id.to_string())
            .or_default()
            .clone();
        TurnLock {
            table: &self.locks,
            thread_id: thread_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Creates the session and runs its opening turn.
    #[instrument(skip(self, new), fields(thread_id = %new.thread_id, variant = %new.variant))]
    pub async fn start_session(&self, new: NewSession) -> Result<TurnOutcome, EngineError> {
        let state = SessionState::new(
            new.thread_id,
            new.identity,
            new.variant,
            new.curriculum,
            new.target_count,
        )?;
        let _turn = self.lock_turn(&state.thread_id).await;

        self.store
            .create(state.clone())
            .await
            .map_err(EngineError::from_store)?;
        info!(target = state.target(), "Session created");
        self.drive(state).await
    }

    /// Appends a human message and runs the turn it triggers.
    #[instrument(skip(self, content), fields(thread_id = %thread_id))]
    pub async fn submit(&self, thread_id: &str, content: &str) -> Result<TurnOutcome, EngineError> {
        self.load(thread_id).await?;
        let _turn = self.lock_turn(thread_id).await;

        let state = self.load(thread_id).await?;
        if state.finished {
            return Err(EngineError::SessionFinished(thread_id.to_string()));
        }
        if route(&state) == RouterState::Dispatching {
            return Err(EngineError::TurnPending(thread_id.to_string()));
        }
        let state = self
            .store
            .put(thread_id, SessionUpdate::append_message(Message::human(content)))
            .await
            .map_err(EngineError::from_store)?;
        self.drive(state).await
    }

    /// Re-runs the control loop on the stored state without new input.
    ///
    /// Used after a turn aborted on a model or results failure. A session that is
    /// already waiting for input returns immediately.
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    pub async fn resume(&self, thread_id: &str) -> Result<TurnOutcome, EngineError> {
        self.load(thread_id).await?;
        let _turn = self.lock_turn(thread_id).await;

        let state = self.load(thread_id).await?;
        self.drive(state).await
    }

    /// Current stored state of a session.
    pub async fn session(&self, thread_id: &str) -> Result<SessionState, EngineError> {
        self.load(thread_id).await
    }

    async fn load(&self, thread_id: &str) -> Result<SessionState, EngineError> {
        self.store
            .get(thread_id)
            .await
            .map_err(EngineError::from_store)?
            .ok_or_else(|| EngineError::SessionNotFound(thread_id.to_string()))
    }

    async fn drive(&self, mut state: SessionState) -> Result<TurnOutcome, EngineError> {
        let registry = ToolRegistry::for_variant(state.variant);
        let mut new_messages = Vec::new();
        let mut steps = 0;
        let mut next = route(&state);

        loop {
            debug!(state = %next, cursor = state.cursor, "Routed");
            match next {
                RouterState::AwaitingExternalInput => {
                    info!(steps, "Turn suspended awaiting input");
                    return Ok(TurnOutcome {
                        status: next,
                        new_messages,
                        state,
                    });
                }
                RouterState::Done => {
                    state = self.offer_results(state).await?;
                    info!(steps, rating = ?state.final_rating, "Interview done");
                    return Ok(TurnOutcome {
                        status: next,
                        new_messages,
                        state,
                    });
                }
                RouterState::Deciding | RouterState::Dispatching => {
                    steps += 1;
                    if steps > self.settings.max_steps_per_turn {
                        error!(limit = self.settings.max_steps_per_turn, "Step limit exceeded");
                        return Err(EngineError::StepLimitExceeded {
                            limit: self.settings.max_steps_per_turn,
                        });
                    }
                }
            }

            if next == RouterState::Deciding {
                let message = self
                    .decision
                    .decide(&state, &registry)
                    .await
                    .inspect_err(|e| error!(error = %e, "Decision step failed"))?;
                state = self.append(&state.thread_id, SessionUpdate::append_message(message.clone())).await?;
                new_messages.push(message);
                next = route(&state);
            } else {
                let calls = state
                    .latest_message()
                    .map(|m| m.invocations().to_vec())
                    .unwrap_or_default();
                let update = self
                    .dispatcher
                    .dispatch(&state, &registry, &calls)
                    .await
                    .inspect_err(|e| error!(error = %e, "Tool dispatch failed"))?;
                new_messages.extend(update.messages.iter().cloned());
                state = self.append(&state.thread_id, update).await?;
                next = after_dispatch();
            }
        }
    }

    async fn append(&self, thread_id: &str, update: SessionUpdate) -> Result<SessionState, EngineError> {
        self.store
            .put(thread_id, update)
            .await
            .map_err(EngineError::from_store)
    }

    /// Hands the result to the sink once; the flag is only set after it succeeds.
    async fn offer_results(&self, state: SessionState) -> Result<SessionState, EngineError> {
        if state.results_recorded {
            return Ok(state);
        }
        self.results
            .record(InterviewResult::from_session(&state))
            .await
            .map_err(EngineError::Results)
            .inspect_err(|e| error!(error = %e, "Recording results failed"))?;
        info!(identity = %state.identity, "Results recorded");
        self.append(&state.thread_id, SessionUpdate::mark_results_recorded())
            .await
    }
}
