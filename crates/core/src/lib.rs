//! Tool-driven interview orchestration.
//!
//! A session is a transcript plus progress counters. Each turn the [`router`] picks
//! the next step, the [`decision`] step asks the model to reply or call tools, and
//! the [`dispatcher`] runs those tools and applies their declared effects. The
//! [`engine`] ties the steps together over a [`store::SessionStore`].

pub mod curriculum;
pub mod decision;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod llm_client;
pub mod policy;
pub mod prompts;
pub mod results;
pub mod router;
pub mod session;
pub mod store;
pub mod tools;
pub mod verdict;

pub use engine::{EngineSettings, InterviewEngine, NewSession, TurnOutcome};
pub use error::{EngineError, StoreError};
pub use policy::Variant;
pub use router::RouterState;
pub use session::{Message, SessionState};
