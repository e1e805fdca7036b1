//! Endpoint and client settings consumed by the authentication core.

use std::time::Duration;

/// Fallback `appName` sent to the identity provider when the host has no title.
pub const DEFAULT_APP_NAME: &str = "Solar App";

/// Remote endpoints the core talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    /// Token endpoint for both authorization_code and refresh_token grants.
    pub token_url: String,
    /// Token introspection endpoint.
    pub introspect_url: String,
    /// Server-side session logout endpoint.
    pub logout_url: String,
    /// Identity provider page the browser is sent to on login.
    pub login_redirect_url: String,
}

impl AuthEndpoints {
    /// Derive the endpoint set from the application and infranode bases.
    ///
    /// `base_infranode_url` is normally a bare host and is reached over https; a value that
    /// already carries a scheme is used unchanged.
    pub fn from_bases(base_url: &str, base_infranode_url: &str, login_redirect_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let infranode = base_infranode_url.trim_end_matches('/');
        let infranode = if infranode.contains("://") {
            infranode.to_string()
        } else {
            format!("https://{}", infranode)
        };

        Self {
            token_url: format!("{}/api/auth/token", base_url),
            introspect_url: format!("{}/innerApp/oauth2/introspect", infranode),
            logout_url: format!("{}/api/auth/logout", base_url),
            login_redirect_url: login_redirect_url.to_string(),
        }
    }
}

/// Everything the state machine needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub endpoints: AuthEndpoints,
    /// Stable identifier of this client, sent on every token endpoint call.
    pub client_id: String,
    /// Used as `appName` when the navigator reports no document title.
    pub fallback_app_name: String,
}

impl AuthSettings {
    pub fn new(endpoints: AuthEndpoints, client_id: impl Into<String>) -> Self {
        Self {
            endpoints,
            client_id: client_id.into(),
            fallback_app_name: DEFAULT_APP_NAME.to_string(),
        }
    }

    pub fn with_fallback_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.fallback_app_name = app_name.into();
        self
    }
}

/// Settings for the HTTP clients built by this crate.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum number of retries for transient failures.
    pub max_retries: u32,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            user_agent: format!("solar-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
