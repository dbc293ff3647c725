//! Error types for the `sdk-auth` crate.
//!
//! Same shape as the other layers: a root `Error` struct holding an error kind
//! tree and an optional source for chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the sdk-auth crate.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in sdk-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Pkce(PkceErrorKind),
    OAuth(OAuthErrorKind),
    Http(HttpErrorKind),
}

/// Malformed PKCE input received from an SDK client.
#[derive(Debug, PartialEq)]
pub enum PkceErrorKind {
    InvalidChallenge,
    InvalidVerifier,
    UnsupportedMethod,
}

/// Errors from talking to a social identity provider.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    AuthorizationUrl,
    TokenExchangeFailed,
    UserInfoFailed,
    InvalidResponse,
    /// The provider account has no usable email address.
    MissingEmail,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Pkce(kind) => write!(f, "PKCE error: {:?}", kind),
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind),
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind),
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
        } else if err.is_request() || err.is_timeout() || err.is_connect() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
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

/// Helper function to create PKCE errors.
pub fn pkce_error(kind: PkceErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Pkce(kind),
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}
