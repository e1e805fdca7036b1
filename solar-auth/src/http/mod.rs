//! HTTP client building with middleware.

mod bearer;
mod client;
mod retry;

pub use bearer::BearerInterceptor;
pub use client::{AuthenticatedClient, AuthenticatedClientBuilder};
pub use retry::BackoffPolicy;
