//! Composition of the state machine with the rest of the application.

mod provider;

pub use provider::{AuthContext, AuthProvider};
