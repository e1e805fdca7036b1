//! Outgoing-request interceptor attaching the live bearer token.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use http::Extensions;
use log::*;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use secrecy::{ExposeSecret, SecretString};

/// Middleware setting `Authorization: Bearer <token>` on every request.
///
/// The interceptor owns a single token slot. Installing a token replaces the previous one under
/// the same write lock, so there is never more than one bearer token active. Clones share the
/// slot, which lets the auth provider swap tokens on a client that is already built.
#[derive(Clone, Default)]
pub struct BearerInterceptor {
    slot: Arc<RwLock<Option<SecretString>>>,
}

impl BearerInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `token`, replacing any installed token. Returns true if one was replaced.
    pub fn install(&self, token: SecretString) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        slot.replace(token).is_some()
    }

    /// Remove the installed token. Returns true if one was installed.
    pub fn uninstall(&self) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        slot.take().is_some()
    }

    pub fn is_installed(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// True when the installed token equals `token`.
    pub fn is_installed_with(&self, token: &SecretString) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| t.expose_secret() == token.expose_secret())
    }

    fn authorization(&self) -> Option<HeaderValue> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        let token = slot.as_ref()?;
        match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                Some(value)
            }
            Err(_) => {
                warn!("Installed bearer token is not a valid header value, sending request without it");
                None
            }
        }
    }
}

#[async_trait]
impl Middleware for BearerInterceptor {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        if let Some(value) = self.authorization() {
            req.headers_mut().insert(AUTHORIZATION, value);
        }
        next.run(req, extensions).await
    }
}
