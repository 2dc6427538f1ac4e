//! Turn orchestration: per-session context, the guard timer, timings and
//! the state machine that ties synthesis, streaming, encoding and
//! publishing together.

mod context;
mod guard;
mod orchestrator;
mod timings;

pub use context::{ConversationContext, SessionStore};
pub use guard::GuardTimer;
pub use orchestrator::{
    DEFAULT_BACKEND_GRACE, TurnOrchestrator, TurnOutcome, TurnRequest, TurnSettings, TurnState,
};
pub use timings::TurnTimings;
