//! # solar-auth
//!
//! Client-side OAuth 2.0 Authorization Code with PKCE for Solar applications:
//! - PKCE verifier/challenge generation and best-effort JWT id extraction
//! - Token store keeping the access token in memory and the verifier durably
//! - Token, introspection and logout endpoint client (cookie-borne refresh)
//! - Sign-in state machine with single-flight initialization and coalesced refresh
//! - Provider attaching the live bearer token to the application's HTTP client
//!
//! ## Usage
//!
//! ```rust,ignore
//! use solar_auth::{
//!     api::HttpAuthApi,
//!     context::AuthProvider,
//!     navigation::MemoryNavigator,
//!     session::AuthStateMachine,
//!     settings::{AuthEndpoints, AuthSettings, HttpClientConfig},
//!     storage::FileStorage,
//!     token::TokenStore,
//! };
//!
//! let machine = AuthStateMachine::new(store, api, navigator, settings);
//! let provider = AuthProvider::mount(Arc::new(machine), HttpClientConfig::default()).await?;
//! if provider.context().client_ready {
//!     provider.client().get(url).send().await?;
//! }
//! ```

pub mod api;
pub mod context;
pub mod crypto;
pub mod error;
pub mod http;
pub mod navigation;
pub mod session;
pub mod settings;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use context::{AuthContext, AuthProvider};
pub use error::{Error, ErrorKind};
pub use session::{AuthPhase, AuthSessionState, AuthStateMachine, RefreshOutcome};
