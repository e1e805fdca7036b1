//! In-memory access token and durably persisted PKCE verifier.

mod store;
mod tokens;

pub use store::{TokenStore, CODE_VERIFIER_KEY, DEFAULT_EXPIRES_IN_SECS};
pub use tokens::AccessToken;
