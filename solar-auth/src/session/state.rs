//! Externally observed authentication state.

use secrecy::{ExposeSecret, SecretString};

use crate::api::UserDetails;

/// Where the state machine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Created, `initialize()` has not run yet.
    Uninitialized,
    /// `initialize()` is running. Guards against a second concurrent run.
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// The `{is_logged_in, user_details, auth_loading, token}` tuple collaborators read.
///
/// Values are only built through the constructors below, which keep the fields consistent
/// with the phase: user details and a token exist only when authenticated, and
/// `auth_loading` is true only before initialization settles.
#[derive(Debug, Clone)]
pub struct AuthSessionState {
    pub phase: AuthPhase,
    pub is_logged_in: bool,
    pub user_details: Option<UserDetails>,
    pub auth_loading: bool,
    pub token: Option<SecretString>,
}

impl AuthSessionState {
    /// State on mount: `{false, None, true, None}`.
    pub fn initial() -> Self {
        Self {
            phase: AuthPhase::Uninitialized,
            ..Self::unauthenticated()
        }
        .loading()
    }

    pub fn initializing() -> Self {
        Self {
            phase: AuthPhase::Initializing,
            ..Self::unauthenticated()
        }
        .loading()
    }

    pub fn authenticated(user_details: UserDetails, token: SecretString) -> Self {
        Self {
            phase: AuthPhase::Authenticated,
            is_logged_in: true,
            user_details: Some(user_details),
            auth_loading: false,
            token: Some(token),
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            phase: AuthPhase::Unauthenticated,
            is_logged_in: false,
            user_details: None,
            auth_loading: false,
            token: None,
        }
    }

    fn loading(mut self) -> Self {
        self.auth_loading = true;
        self
    }

    /// True when authenticated with exactly `token`.
    pub fn is_authenticated_with(&self, token: &str) -> bool {
        self.phase == AuthPhase::Authenticated
            && self
                .token
                .as_ref()
                .is_some_and(|t| t.expose_secret() == token)
    }
}

impl Default for AuthSessionState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_loading_and_signed_out() {
        let state = AuthSessionState::initial();
        assert_eq!(state.phase, AuthPhase::Uninitialized);
        assert!(!state.is_logged_in);
        assert!(state.user_details.is_none());
        assert!(state.auth_loading);
        assert!(state.token.is_none());
    }

    #[test]
    fn test_only_pre_settled_phases_are_loading() {
        assert!(AuthSessionState::initializing().auth_loading);
        assert!(!AuthSessionState::unauthenticated().auth_loading);
        let details = UserDetails {
            active: true,
            ..UserDetails::default()
        };
        assert!(
            !AuthSessionState::authenticated(details, SecretString::from("t".to_string()))
                .auth_loading
        );
    }

    #[test]
    fn test_is_authenticated_with() {
        let details = UserDetails {
            active: true,
            ..UserDetails::default()
        };
        let state = AuthSessionState::authenticated(details, SecretString::from("tok1".to_string()));
        assert!(state.is_authenticated_with("tok1"));
        assert!(!state.is_authenticated_with("tok2"));
        assert!(!AuthSessionState::unauthenticated().is_authenticated_with("tok1"));
    }
}
