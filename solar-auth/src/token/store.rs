//! Token store holding the live access token and the persisted code verifier.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use log::*;
use secrecy::SecretString;

use super::AccessToken;
use crate::crypto::PkceVerifier;
use crate::error::Error;
use crate::storage::DurableStorage;

/// Durable storage key of the PKCE code verifier.
pub const CODE_VERIFIER_KEY: &str = "solar_oauth_code_verifier";

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Store for the access token (memory only) and the code verifier (durable storage).
///
/// One instance is created per provider and injected into the state machine. The access token
/// is kept out of durable storage so it is never readable from persisted state; the verifier
/// has to be durable because it must survive the navigation to the identity provider and back.
pub struct TokenStore {
    access: RwLock<Option<AccessToken>>,
    durable: Arc<dyn DurableStorage>,
}

impl TokenStore {
    /// Create an empty store persisting the verifier to `durable`.
    pub fn new(durable: Arc<dyn DurableStorage>) -> Self {
        Self {
            access: RwLock::new(None),
            durable,
        }
    }

    /// Replace the access token and its expiry in one write.
    pub fn set_access_token(&self, token: SecretString, expires_in_secs: i64) {
        let issued = AccessToken::issued_now(token, expires_in_secs);
        debug!("Storing access token expiring at {}", issued.expires_at);
        *self.access.write().unwrap_or_else(|e| e.into_inner()) = Some(issued);
    }

    /// Current token and expiry as one value.
    pub fn current(&self) -> Option<AccessToken> {
        self.access
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn access_token(&self) -> Option<SecretString> {
        self.current().map(|t| t.token)
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.current().map(|t| t.expires_at)
    }

    /// The stored token, only if its expiry is still in the future.
    pub fn unexpired(&self) -> Option<AccessToken> {
        self.current().filter(|t| !t.is_expired())
    }

    pub fn has_unexpired_token(&self) -> bool {
        self.unexpired().is_some()
    }

    /// True when the stored token equals `token`, regardless of expiry.
    pub fn holds(&self, token: &str) -> bool {
        self.current().is_some_and(|t| t.matches(token))
    }

    /// Drop the access token and its expiry.
    pub fn clear(&self) {
        *self.access.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn persisted_verifier(&self) -> Result<Option<PkceVerifier>, Error> {
        Ok(self
            .durable
            .get(CODE_VERIFIER_KEY)?
            .map(PkceVerifier::from_string))
    }

    /// Persist `verifier`, overwriting any verifier from an earlier login.
    pub fn set_persisted_verifier(&self, verifier: &PkceVerifier) -> Result<(), Error> {
        self.durable.set(CODE_VERIFIER_KEY, verifier.as_str())
    }

    pub fn clear_persisted_verifier(&self) -> Result<(), Error> {
        self.durable.remove(CODE_VERIFIER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use secrecy::ExposeSecret;

    fn store() -> (TokenStore, MemoryStorage) {
        let durable = MemoryStorage::new();
        (TokenStore::new(Arc::new(durable.clone())), durable)
    }

    #[test]
    fn test_token_and_expiry_set_together() {
        let (store, _) = store();
        assert!(store.access_token().is_none());
        assert!(store.expiry().is_none());

        store.set_access_token(SecretString::from("tok1".to_string()), 3600);

        assert_eq!(store.access_token().unwrap().expose_secret(), "tok1");
        assert!(store.expiry().unwrap() > Utc::now());
        assert!(store.has_unexpired_token());
        assert!(store.holds("tok1"));
    }

    #[test]
    fn test_clear_drops_token_and_expiry() {
        let (store, _) = store();
        store.set_access_token(SecretString::from("tok1".to_string()), 3600);
        store.clear();

        assert!(store.current().is_none());
        assert!(store.access_token().is_none());
        assert!(store.expiry().is_none());
    }

    #[test]
    fn test_expired_token_is_not_unexpired() {
        let (store, _) = store();
        store.set_access_token(SecretString::from("old".to_string()), -1);

        assert!(store.current().is_some());
        assert!(store.unexpired().is_none());
        assert!(!store.has_unexpired_token());
    }

    #[test]
    fn test_access_token_never_reaches_durable_storage() {
        let (store, durable) = store();
        store.set_access_token(SecretString::from("tok1".to_string()), 3600);
        assert_eq!(durable.get(CODE_VERIFIER_KEY).unwrap(), None);
    }

    #[test]
    fn test_verifier_is_persisted_under_fixed_key() {
        let (store, durable) = store();
        assert!(store.persisted_verifier().unwrap().is_none());

        let first = PkceVerifier::generate();
        store.set_persisted_verifier(&first).unwrap();
        let second = PkceVerifier::generate();
        store.set_persisted_verifier(&second).unwrap();

        assert_eq!(
            durable.get(CODE_VERIFIER_KEY).unwrap(),
            Some(second.as_str().to_string())
        );
        assert_eq!(store.persisted_verifier().unwrap(), Some(second));

        store.clear_persisted_verifier().unwrap();
        assert!(store.persisted_verifier().unwrap().is_none());
    }
}
