//! Pure helpers for the PKCE flow: random strings, code challenges and
//! best-effort JWT id extraction.

mod jwt;
mod pkce;

pub use jwt::extract_jwt_id;
pub use pkce::{
    create_code_challenge, generate_random_string, PkceChallenge, PkceVerifier, VERIFIER_LENGTH,
};
