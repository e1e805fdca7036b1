//! PKCE (Proof Key for Code Exchange) support for OAuth 2.0.
//!
//! Implements the S256 method of RFC 7636 for the public browser-style client.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Symbols a verifier is drawn from.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of every generated code verifier.
pub const VERIFIER_LENGTH: usize = 43;

/// Uniformly sample `length` characters from `[a-z0-9]`.
pub fn generate_random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// `base64url(SHA256(verifier))` without padding.
pub fn create_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// PKCE code verifier (random string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generate a new 43 character verifier.
    pub fn generate() -> Self {
        Self(generate_random_string(VERIFIER_LENGTH))
    }

    /// Create a PKCE verifier from an existing string.
    pub fn from_string(verifier: String) -> Self {
        Self(verifier)
    }

    /// Get the verifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate the corresponding code challenge.
    pub fn challenge(&self) -> PkceChallenge {
        PkceChallenge::from_verifier(self)
    }
}

/// PKCE code challenge (SHA256 hash of verifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Create a code challenge from a verifier.
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        Self(create_code_challenge(verifier.as_str()))
    }

    /// Get the challenge string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
