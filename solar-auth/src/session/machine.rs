//! Authentication state machine driving validate, refresh and code exchange.
//!
//! ```text
//! Uninitialized --initialize()--> Initializing --+--> Authenticated
//!                                                +--> Unauthenticated
//! Authenticated <--refresh/validate--> Unauthenticated
//! ```

use std::sync::Arc;

use log::*;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{watch, Mutex};
use url::Url;

use super::{AuthPhase, AuthSessionState};
use crate::api::{AuthApi, TokenGrant, TokenRequest, UserDetails};
use crate::crypto::{extract_jwt_id, PkceVerifier};
use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::navigation::{authorization_code, without_query_param, Navigator, CODE_PARAM};
use crate::settings::AuthSettings;
use crate::token::{TokenStore, DEFAULT_EXPIRES_IN_SECS};

/// Result of a successful [`AuthStateMachine::refresh_token`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new token was issued and introspected as active.
    Refreshed,
    /// The server reported no refreshable session; the state is now signed out.
    AuthRequired,
    /// Another refresh finished while this one waited, and its token is reused.
    Coalesced,
}

/// Owns the published [`AuthSessionState`] and is the only writer of user details.
///
/// Collaborators are injected so tests can supply their own store, API and navigator.
pub struct AuthStateMachine {
    store: Arc<TokenStore>,
    api: Arc<dyn AuthApi>,
    navigator: Arc<dyn Navigator>,
    settings: AuthSettings,
    state: watch::Sender<AuthSessionState>,
    refresh_lock: Mutex<()>,
}

impl AuthStateMachine {
    pub fn new(
        store: Arc<TokenStore>,
        api: Arc<dyn AuthApi>,
        navigator: Arc<dyn Navigator>,
        settings: AuthSettings,
    ) -> Self {
        let (state, _) = watch::channel(AuthSessionState::initial());
        Self {
            store,
            api,
            navigator,
            settings,
            state,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthSessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthSessionState> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> AuthPhase {
        self.state.borrow().phase
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Settle the initial sign-in state. Runs once per machine.
    ///
    /// Tries, in order: the unexpired in-memory token, an authorization code in the current
    /// URL, then a cookie-borne refresh. Failures never reach the caller; they settle the
    /// machine as unauthenticated. Calls after the first return the current state without
    /// doing any work.
    pub async fn initialize(&self) -> AuthSessionState {
        let started = self.state.send_if_modified(|state| {
            if state.phase == AuthPhase::Uninitialized {
                *state = AuthSessionState::initializing();
                true
            } else {
                false
            }
        });

        if !started {
            debug!("Auth state already initialized, skipping");
            return self.state();
        }

        if let Err(e) = self.run_initialization().await {
            info!("No authenticated session: {}", e);
            self.reset();
        }

        // Paths that never settled (e.g. a swallowed code exchange failure) end signed out.
        self.state.send_if_modified(|state| {
            if state.phase == AuthPhase::Initializing {
                *state = AuthSessionState::unauthenticated();
                true
            } else {
                false
            }
        });

        let state = self.state();
        info!(
            "Auth initialized: logged_in={}, user={}",
            state.is_logged_in,
            state
                .user_details
                .as_ref()
                .map(|u| u.email.as_str())
                .unwrap_or("-")
        );
        state
    }

    async fn run_initialization(&self) -> Result<(), Error> {
        if let Some(current) = self.store.unexpired() {
            debug!("Validating in-memory access token");
            return self
                .validate_and_set_user(current.token.expose_secret())
                .await;
        }

        let location = self.navigator.current_url();
        if let Some(code) = authorization_code(&location) {
            debug!("Found authorization code in URL, exchanging it");
            let result = self.exchange_code_for_token(&code).await;
            self.navigator
                .replace_url(without_query_param(&location, CODE_PARAM));
            if let Err(e) = result {
                warn!("Authorization code exchange failed: {}", e);
            }
            return Ok(());
        }

        debug!("No token and no authorization code, trying refresh");
        self.refresh_token().await.map(|_| ())
    }

    /// Introspect `access_token` and settle authenticated if it is active.
    ///
    /// Skips the network when already authenticated with this exact token. An inactive token
    /// or a failed introspection falls back to [`Self::refresh_token`]; if that fails too the
    /// state is cleared and the refresh error is returned.
    pub async fn validate_and_set_user(&self, access_token: &str) -> Result<(), Error> {
        if self.is_validated(access_token) {
            trace!("Access token already validated, skipping introspection");
            return Ok(());
        }

        match self.introspect(access_token).await {
            Ok(details) if details.active => {
                self.settle_authenticated(details, access_token);
                return Ok(());
            }
            Ok(_) => info!("Access token is not active anymore, refreshing"),
            Err(e) => warn!("Token introspection failed, refreshing: {}", e),
        }

        self.refresh_token().await.map(|_| ())
    }

    /// Exchange an authorization code using the persisted PKCE verifier.
    ///
    /// Fails with `MissingCodeVerifier` before any network call when no verifier is stored.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<(), Error> {
        let verifier = self.store.persisted_verifier()?.ok_or_else(|| {
            oauth_error(
                OAuthErrorKind::MissingCodeVerifier,
                "No PKCE code verifier persisted for this code exchange",
            )
        })?;

        let request =
            TokenRequest::authorization_code(&self.settings.client_id, code, verifier.as_str());

        match self.api.exchange_token(&request).await? {
            TokenGrant::Issued {
                access_token,
                expires_in,
                ..
            } => {
                self.store_token(&access_token, expires_in);
                info!("Exchanged authorization code for an access token");
                self.validate_and_set_user(&access_token).await
            }
            TokenGrant::AuthRequired { message } | TokenGrant::Other { message, .. } => {
                Err(oauth_error(
                    OAuthErrorKind::TokenExchangeFailed,
                    &format!(
                        "Token endpoint issued no token for the authorization code: {}",
                        message.unwrap_or_default()
                    ),
                ))
            }
        }
    }

    /// Obtain a new access token with the cookie-borne refresh grant.
    ///
    /// Concurrent calls are serialized; a caller that waited behind a refresh which produced a
    /// new authenticated token returns `Coalesced` without a second request. Any error clears
    /// the token state and settles unauthenticated before it is returned.
    pub async fn refresh_token(&self) -> Result<RefreshOutcome, Error> {
        let observed = self.store.access_token();
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.store.unexpired() {
            let replaced = observed
                .as_ref()
                .map_or(true, |o| !current.matches(o.expose_secret()));
            if replaced && self.phase() == AuthPhase::Authenticated {
                debug!("Token was refreshed by a concurrent call");
                return Ok(RefreshOutcome::Coalesced);
            }
        }

        match self.perform_refresh().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                self.reset();
                Err(e)
            }
        }
    }

    async fn perform_refresh(&self) -> Result<RefreshOutcome, Error> {
        let request = TokenRequest::refresh(&self.settings.client_id);

        match self.api.exchange_token(&request).await? {
            TokenGrant::AuthRequired { message } => {
                info!(
                    "No refreshable session: {}",
                    message.as_deref().unwrap_or("auth_required")
                );
                self.reset();
                Ok(RefreshOutcome::AuthRequired)
            }
            TokenGrant::Other { status, message } => Err(oauth_error(
                OAuthErrorKind::TokenExchangeFailed,
                &format!(
                    "Refresh answered with status {}: {}",
                    status,
                    message.unwrap_or_default()
                ),
            )),
            TokenGrant::Issued {
                access_token,
                expires_in,
                ..
            } => {
                self.store_token(&access_token, expires_in);

                // Introspected once here; an inactive fresh token is not refreshed again.
                let details = self.introspect(&access_token).await?;
                if !details.active {
                    return Err(oauth_error(
                        OAuthErrorKind::InactiveToken,
                        "Refreshed access token is not active",
                    ));
                }

                self.settle_authenticated(details, &access_token);
                debug!("Access token refreshed");
                Ok(RefreshOutcome::Refreshed)
            }
        }
    }

    /// Start a login: persist a new verifier and redirect to the identity provider.
    ///
    /// On a browser host control does not come back after a successful redirect.
    pub fn login(&self) -> Result<(), Error> {
        let verifier = PkceVerifier::generate();
        self.store.set_persisted_verifier(&verifier)?;
        let challenge = verifier.challenge();

        let app_name = self
            .navigator
            .document_title()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| self.settings.fallback_app_name.clone());

        let mut target = Url::parse(&self.settings.endpoints.login_redirect_url)?;
        target
            .query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("code_challenge", challenge.as_str())
            .append_pair("code_challenge_method", "S256")
            .append_pair("redirect_uri", self.navigator.current_url().as_str())
            .append_pair("appName", &app_name);

        self.navigator.redirect(target)
    }

    /// End the session. The server call is best effort; local state is always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("Logout request failed, clearing local session anyway: {}", e);
        }
        self.reset();
        info!("Signed out");
    }

    async fn introspect(&self, access_token: &str) -> Result<UserDetails, Error> {
        match extract_jwt_id(access_token) {
            Some(jti) => self.api.validate_token(&jti).await,
            None => self.api.validate_token(access_token).await,
        }
    }

    fn is_validated(&self, access_token: &str) -> bool {
        self.state.borrow().is_authenticated_with(access_token) && self.store.holds(access_token)
    }

    fn store_token(&self, access_token: &str, expires_in: Option<i64>) {
        self.store.set_access_token(
            SecretString::from(access_token.to_string()),
            expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        );
    }

    fn settle_authenticated(&self, details: UserDetails, access_token: &str) {
        self.state.send_replace(AuthSessionState::authenticated(
            details,
            SecretString::from(access_token.to_string()),
        ));
    }

    /// Clear all token state and settle unauthenticated.
    fn reset(&self) {
        self.store.clear();
        self.state.send_replace(AuthSessionState::unauthenticated());
    }
}
