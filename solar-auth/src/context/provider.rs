//! Auth provider: runs initialization once, then keeps the outgoing client's bearer token in
//! step with the published session state.

use std::sync::Arc;

use log::*;
use secrecy::SecretString;
use tokio::task::JoinHandle;

use crate::api::UserDetails;
use crate::error::Error;
use crate::http::{AuthenticatedClient, AuthenticatedClientBuilder, BearerInterceptor};
use crate::session::{AuthSessionState, AuthStateMachine};
use crate::settings::HttpClientConfig;

/// What the rest of the application reads from the auth core.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub is_logged_in: bool,
    pub user_details: Option<UserDetails>,
    pub auth_loading: bool,
    pub token: Option<SecretString>,
    /// Authenticated API calls must wait for this.
    pub client_ready: bool,
}

impl From<&AuthSessionState> for AuthContext {
    fn from(state: &AuthSessionState) -> Self {
        let client_ready =
            !state.auth_loading && (!state.is_logged_in || state.token.is_some());
        Self {
            is_logged_in: state.is_logged_in,
            user_details: state.user_details.clone(),
            auth_loading: state.auth_loading,
            token: state.token.clone(),
            client_ready,
        }
    }
}

/// Owner of the application's authenticated HTTP client.
///
/// Dropping the provider stops the task that follows token changes.
pub struct AuthProvider {
    machine: Arc<AuthStateMachine>,
    interceptor: BearerInterceptor,
    client: AuthenticatedClient,
    watcher: JoinHandle<()>,
}

impl AuthProvider {
    /// Build the outgoing client, start following state changes and run initialization.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn mount(
        machine: Arc<AuthStateMachine>,
        client_config: HttpClientConfig,
    ) -> Result<Self, Error> {
        let interceptor = BearerInterceptor::new();
        let client = AuthenticatedClientBuilder::new()
            .with_config(client_config)
            .with_interceptor(interceptor.clone())
            .build()?;

        let mut changes = machine.subscribe();
        let followed = interceptor.clone();
        let watcher = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let state = changes.borrow_and_update().clone();
                sync_interceptor(&followed, &state);
            }
            trace!("Auth state channel closed, stopping token watcher");
        });

        machine.initialize().await;
        sync_interceptor(&interceptor, &machine.state());

        Ok(Self {
            machine,
            interceptor,
            client,
            watcher,
        })
    }

    pub fn context(&self) -> AuthContext {
        AuthContext::from(&self.machine.state())
    }

    /// Client carrying `Authorization: Bearer <token>` while signed in.
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    pub fn interceptor(&self) -> &BearerInterceptor {
        &self.interceptor
    }

    pub fn machine(&self) -> &Arc<AuthStateMachine> {
        &self.machine
    }

    /// Run `f` only when signed in.
    pub fn signed_in<R>(&self, f: impl FnOnce(&UserDetails) -> R) -> Option<R> {
        let state = self.machine.state();
        if state.auth_loading || !state.is_logged_in {
            return None;
        }
        state.user_details.as_ref().map(f)
    }

    /// Run `f` only once initialization settled signed out.
    pub fn signed_out<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let state = self.machine.state();
        if state.auth_loading || state.is_logged_in {
            return None;
        }
        Some(f())
    }

    /// Start the login redirect. Failures are logged and returned.
    pub fn login(&self) -> Result<(), Error> {
        self.machine.login().map_err(|e| {
            error!("Failed to start login: {}", e);
            e
        })
    }

    pub async fn logout(&self) {
        self.machine.logout().await;
        sync_interceptor(&self.interceptor, &self.machine.state());
    }
}

impl Drop for AuthProvider {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

fn sync_interceptor(interceptor: &BearerInterceptor, state: &AuthSessionState) {
    match (state.is_logged_in, &state.token) {
        (true, Some(token)) => {
            if !interceptor.is_installed_with(token) {
                interceptor.install(token.clone());
                debug!("Installed bearer token on outgoing client");
            }
        }
        _ => {
            if interceptor.uninstall() {
                debug!("Removed bearer token from outgoing client");
            }
        }
    }
}
