//! Access token type.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

/// Bearer token plus the absolute instant it stops being usable.
///
/// The token and its expiry only exist together, so a reader can never observe one without
/// the other.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Opaque bearer token.
    pub token: SecretString,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token that expires `expires_in_secs` seconds from now.
    ///
    /// Lifetimes beyond what `DateTime<Utc>` can represent saturate at its bounds, so a
    /// hostile `expires_in` can never panic.
    pub fn issued_now(token: SecretString, expires_in_secs: i64) -> Self {
        Self {
            token,
            expires_at: expiry_after(Utc::now(), expires_in_secs),
        }
    }

    /// True once the expiry instant is not in the future anymore.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Get the remaining time until expiration.
    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Compare the bearer value with a raw token string.
    pub fn matches(&self, token: &str) -> bool {
        self.token.expose_secret() == token
    }
}

fn expiry_after(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    let saturated = if secs < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };
    Duration::try_seconds(secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(saturated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_not_expired() {
        let token = AccessToken::issued_now(SecretString::from("test".to_string()), 3600);
        assert!(!token.is_expired());
        assert!(token.time_until_expiry() > Duration::minutes(59));
    }

    #[test]
    fn test_token_expired() {
        let token = AccessToken::issued_now(SecretString::from("test".to_string()), -60);
        assert!(token.is_expired());
    }

    #[test]
    fn test_token_matches_raw_value() {
        let token = AccessToken::issued_now(SecretString::from("tok1".to_string()), 60);
        assert!(token.matches("tok1"));
        assert!(!token.matches("tok2"));
    }

    #[test]
    fn test_huge_lifetime_saturates_instead_of_panicking() {
        for secs in [10_000_000_000_000, i64::MAX] {
            let token = AccessToken::issued_now(SecretString::from("tok".to_string()), secs);
            assert_eq!(token.expires_at, DateTime::<Utc>::MAX_UTC);
            assert!(!token.is_expired());
        }
    }

    #[test]
    fn test_negative_lifetime_is_already_expired() {
        let token = AccessToken::issued_now(SecretString::from("tok".to_string()), -3600);
        assert!(token.is_expired());

        let floor = AccessToken::issued_now(SecretString::from("tok".to_string()), i64::MIN);
        assert_eq!(floor.expires_at, DateTime::<Utc>::MIN_UTC);
        assert!(floor.is_expired());
    }
}
