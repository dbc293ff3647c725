//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use sdk_auth::error::{Error as SdkAuthError, ErrorKind as SdkAuthErrorKind, PkceErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries. Ex. `domain` is dependent on `entity_api`, and `web` is dependent on `domain`.
/// but `web` should not be dependent, directly, on `entity_api`. Ultimately the various
/// `error_kind`s are used by `web` to return appropriate HTTP status codes and messages to the client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
    /// Failures of the SDK sign-in flow that are reported to SDK clients in OAuth form.
    Sdk(SdkErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Config,
    /// Input rejected by a domain rule, with a message safe to show the caller.
    Invalid(String),
    Other(String),
}

/// Enum representing the various kinds of entity errors that can bubble up from the "Entity" layer (`entity_api` and `entity`).
/// These errors are translated from the `entity_api` layer to the `domain` layer and reduced to a subset of error kinds
/// that are relevant to the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    NotFound,
    Invalid,
    Unauthenticated,
    Conflict,
    NotUpdated,
    DbTransaction,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Other(String),
}

/// OAuth flavoured failures of the SDK flow. The payload is the human readable
/// `error_description`.
#[derive(Debug, PartialEq)]
pub enum SdkErrorKind {
    /// No project has the presented public key.
    UnknownProject,
    /// Well formed request that the project's settings do not allow.
    Unprocessable(String),
    InvalidRequest(String),
    InvalidGrant(String),
    InvalidClient(String),
    /// Wrong end user credentials.
    AccessDenied,
    /// The end user's email is already registered for the project.
    Conflict(String),
    /// Missing, malformed or expired access token.
    InvalidToken,
}

impl Error {
    pub fn sdk(kind: SdkErrorKind) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Sdk(kind),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Invalid(message.into())),
        }
    }

    pub fn config() -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api`` layer to the `domain`` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let entity_error_kind = match err.error_kind {
            EntityApiErrorKind::RecordNotFound => EntityErrorKind::NotFound,
            EntityApiErrorKind::InvalidQueryTerm => EntityErrorKind::Invalid,
            EntityApiErrorKind::RecordUnauthenticated => EntityErrorKind::Unauthenticated,
            EntityApiErrorKind::RecordAlreadyExists => EntityErrorKind::Conflict,
            EntityApiErrorKind::RecordNotUpdated => EntityErrorKind::NotUpdated,
            EntityApiErrorKind::SystemError => EntityErrorKind::DbTransaction,
            _ => EntityErrorKind::Other("EntityErrorKind".to_string()),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(entity_error_kind)),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "JWT encoding related error".to_string(),
            )),
        }
    }
}

impl From<SdkAuthError> for Error {
    fn from(err: SdkAuthError) -> Self {
        let error_kind = match &err.error_kind {
            SdkAuthErrorKind::Pkce(PkceErrorKind::InvalidChallenge) => DomainErrorKind::Sdk(
                SdkErrorKind::InvalidRequest("code_challenge is malformed".to_string()),
            ),
            SdkAuthErrorKind::Pkce(PkceErrorKind::InvalidVerifier) => DomainErrorKind::Sdk(
                SdkErrorKind::InvalidRequest("code_verifier is malformed".to_string()),
            ),
            SdkAuthErrorKind::Pkce(PkceErrorKind::UnsupportedMethod) => DomainErrorKind::Sdk(
                SdkErrorKind::InvalidRequest("code_challenge_method must be S256".to_string()),
            ),
            SdkAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            SdkAuthErrorKind::OAuth(_) => {
                DomainErrorKind::External(ExternalErrorKind::Other("OAuth error".to_string()))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk_auth::oauth::PkceVerifier;

    #[test]
    fn entity_conflict_maps_to_conflict() {
        let err: Error = EntityApiError {
            source: None,
            error_kind: EntityApiErrorKind::RecordAlreadyExists,
        }
        .into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict))
        );
    }

    #[test]
    fn malformed_verifier_maps_to_invalid_request() {
        let err: Error = PkceVerifier::parse("too-short").unwrap_err().into();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Sdk(SdkErrorKind::InvalidRequest(_))
        ));
    }
}
