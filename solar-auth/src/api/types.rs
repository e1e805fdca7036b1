//! Wire types of the token and introspection endpoints.

use serde::{Deserialize, Serialize};

use crate::error::{oauth_error, Error, OAuthErrorKind};

/// Status the token endpoint answers with when there is no session to refresh.
pub const AUTH_REQUIRED_STATUS: &str = "auth_required";

/// Body of a token endpoint call.
///
/// Serializes to `{client_id, grant_type:"authorization_code", code, code_verifier}` or to
/// `{client_id, grant_type:"refresh_token"}`. The refresh token itself travels as a cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest {
    pub client_id: String,
    #[serde(flatten)]
    pub grant: Grant,
}

/// Grant carried by a [`TokenRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum Grant {
    AuthorizationCode { code: String, code_verifier: String },
    RefreshToken,
}

impl TokenRequest {
    pub fn authorization_code(client_id: &str, code: &str, code_verifier: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            grant: Grant::AuthorizationCode {
                code: code.to_string(),
                code_verifier: code_verifier.to_string(),
            },
        }
    }

    pub fn refresh(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            grant: Grant::RefreshToken,
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self.grant {
            Grant::AuthorizationCode { .. } => "authorization_code",
            Grant::RefreshToken => "refresh_token",
        }
    }
}

/// Raw token endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Interpreted token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    /// A new access token was issued.
    Issued {
        access_token: String,
        token_type: Option<String>,
        expires_in: Option<i64>,
    },
    /// The server has no refreshable session. A valid answer, not a failure.
    AuthRequired { message: Option<String> },
    /// Any other status without a token.
    Other {
        status: String,
        message: Option<String>,
    },
}

impl TryFrom<TokenResponse> for TokenGrant {
    type Error = Error;

    fn try_from(response: TokenResponse) -> Result<Self, Self::Error> {
        match (response.access_token, response.status) {
            (Some(access_token), _) => Ok(TokenGrant::Issued {
                access_token,
                token_type: response.token_type,
                expires_in: response.expires_in,
            }),
            (None, Some(status)) if status == AUTH_REQUIRED_STATUS => Ok(TokenGrant::AuthRequired {
                message: response.message,
            }),
            (None, Some(status)) => Ok(TokenGrant::Other {
                status,
                message: response.message,
            }),
            (None, None) => Err(oauth_error(
                OAuthErrorKind::IncompleteTokenData,
                "Token response has neither access_token nor status",
            )),
        }
    }
}

/// Body of an introspection call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntrospectionRequest<'a> {
    pub token: &'a str,
    pub token_type_hint: &'a str,
}

impl<'a> IntrospectionRequest<'a> {
    pub fn access_token(token: &'a str) -> Self {
        Self {
            token,
            token_type_hint: "access_token",
        }
    }
}

/// Introspection result for the current token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetails {
    pub active: bool,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_authorization_code_request_body() {
        let request = TokenRequest::authorization_code("c1", "abc123", "xyz");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "client_id": "c1",
                "grant_type": "authorization_code",
                "code": "abc123",
                "code_verifier": "xyz",
            })
        );
        assert_eq!(request.grant_type(), "authorization_code");
    }

    #[test]
    fn test_refresh_request_body_has_no_credential() {
        let request = TokenRequest::refresh("c1");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "client_id": "c1", "grant_type": "refresh_token" })
        );
    }

    #[test]
    fn test_token_response_with_token_is_issued() {
        let response: TokenResponse =
            serde_json::from_value(json!({ "access_token": "tok1", "expires_in": 3600 })).unwrap();
        assert_eq!(
            TokenGrant::try_from(response).unwrap(),
            TokenGrant::Issued {
                access_token: "tok1".to_string(),
                token_type: None,
                expires_in: Some(3600),
            }
        );
    }

    #[test]
    fn test_auth_required_is_a_value() {
        let response: TokenResponse = serde_json::from_value(
            json!({ "status": "auth_required", "message": "no session" }),
        )
        .unwrap();
        assert_eq!(
            TokenGrant::try_from(response).unwrap(),
            TokenGrant::AuthRequired {
                message: Some("no session".to_string())
            }
        );
    }

    #[test]
    fn test_other_status_without_token() {
        let response: TokenResponse =
            serde_json::from_value(json!({ "status": "locked" })).unwrap();
        assert!(matches!(
            TokenGrant::try_from(response).unwrap(),
            TokenGrant::Other { status, .. } if status == "locked"
        ));
    }

    #[test]
    fn test_empty_token_response_is_incomplete() {
        let response: TokenResponse = serde_json::from_value(json!({ "token_type": "Bearer" })).unwrap();
        let result = TokenGrant::try_from(response);
        assert!(matches!(
            result,
            Err(Error {
                error_kind: ErrorKind::OAuth(OAuthErrorKind::IncompleteTokenData),
                ..
            })
        ));
    }

    #[test]
    fn test_inactive_introspection_defaults_missing_fields() {
        let details: UserDetails = serde_json::from_value(json!({ "active": false })).unwrap();
        assert!(!details.active);
        assert!(details.email.is_empty());
    }

    #[test]
    fn test_introspection_request_body() {
        assert_eq!(
            serde_json::to_value(IntrospectionRequest::access_token("jti-1")).unwrap(),
            json!({ "token": "jti-1", "token_type_hint": "access_token" })
        );
    }
}
