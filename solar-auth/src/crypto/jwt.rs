//! Best-effort JWT id extraction.
//!
//! The payload is decoded without any signature check. The result is only used to pick an
//! introspection key; the introspection endpoint stays the trust boundary.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::Deserialize;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

#[derive(Deserialize)]
struct Claims {
    jti: Option<String>,
}

/// Return the `jti` claim of a three segment token, or `None` for anything else.
pub fn extract_jwt_id(token: &str) -> Option<String> {
    let mut segments = token.split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);
    segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.jti
}
