//! Error types for the `solar-auth` crate.
//!
//! A root `Error` struct carries an error kind tree plus an optional source for chaining,
//! so callers can match on what went wrong without losing the underlying cause.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for solar-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in solar-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    OAuth(OAuthErrorKind),
    Http(HttpErrorKind),
    Storage(StorageErrorKind),
    Navigation(NavigationErrorKind),
}

/// Errors from the OAuth protocol layer.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// The token endpoint answered without `access_token` and without `status`.
    IncompleteTokenData,
    /// A code exchange was attempted but no PKCE verifier was persisted.
    MissingCodeVerifier,
    /// Introspection reported the token as not active.
    InactiveToken,
    /// The token endpoint answered with a status other than a token or `auth_required`.
    TokenExchangeFailed,
    /// A response body could not be decoded.
    InvalidResponse,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    Network,
    /// Non-2xx answer, with the raw response body.
    Status { status: u16, body: String },
}

/// Errors from durable storage operations.
#[derive(Debug, PartialEq)]
pub enum StorageErrorKind {
    ReadFailed,
    WriteFailed,
}

/// Errors from URL handling and browser-style navigation.
#[derive(Debug, PartialEq)]
pub enum NavigationErrorKind {
    InvalidUrl,
    RedirectFailed,
}

impl Error {
    /// True when the error is an HTTP answer with the given status code.
    pub fn is_status(&self, code: u16) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::Http(HttpErrorKind::Status { status, .. }) if status == code
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind),
            ErrorKind::Http(HttpErrorKind::Status { status, body }) => {
                write!(f, "HTTP error: status {} ({})", status, body)
            }
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind),
            ErrorKind::Storage(kind) => write!(f, "Storage error: {:?}", kind),
            ErrorKind::Navigation(kind) => write!(f, "Navigation error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_decode() {
            ErrorKind::OAuth(OAuthErrorKind::InvalidResponse)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            other => Error {
                source: Some(Box::new(other)),
                error_kind: ErrorKind::Http(HttpErrorKind::Network),
            },
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Navigation(NavigationErrorKind::InvalidUrl),
        }
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create an HTTP status error from a non-2xx response.
pub fn status_error(status: u16, body: String) -> Error {
    Error {
        source: None,
        error_kind: ErrorKind::Http(HttpErrorKind::Status { status, body }),
    }
}

/// Helper function to create storage errors.
pub fn storage_error(kind: StorageErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Storage(kind),
    }
}

/// Helper function to create navigation errors.
pub fn navigation_error(kind: NavigationErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Navigation(kind),
    }
}
