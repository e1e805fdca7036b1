//! Remote calls of the auth core: token endpoint, introspection and logout.

mod client;
mod types;

pub use client::{AuthApi, HttpAuthApi};
pub use types::{
    Grant, IntrospectionRequest, TokenGrant, TokenRequest, TokenResponse, UserDetails,
    AUTH_REQUIRED_STATUS,
};
