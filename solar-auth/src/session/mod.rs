//! Sign-in state machine and the state it publishes.

mod machine;
mod state;

pub use machine::{AuthStateMachine, RefreshOutcome};
pub use state::{AuthPhase, AuthSessionState};
