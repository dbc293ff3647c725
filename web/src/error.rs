use std::error::Error as StdError;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
    SdkErrorKind,
};

extern crate log;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound => {
                        (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
                    }
                    EntityErrorKind::Invalid => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY").into_response()
                    }
                    EntityErrorKind::Unauthenticated => {
                        (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
                    }
                    EntityErrorKind::Conflict | EntityErrorKind::NotUpdated => {
                        (StatusCode::CONFLICT, "CONFLICT").into_response()
                    }
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => {
                        error!("Entity error: {:?}", self.0.source);
                        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                    }
                },
                InternalErrorKind::Invalid(message) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
                }
                InternalErrorKind::Config | InternalErrorKind::Other(_) => {
                    error!("Internal error: {:?}", self.0.source);
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => {
                    (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
                }
                ExternalErrorKind::Other(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            DomainErrorKind::Sdk(sdk_error_kind) => oauth_error_response(sdk_error_kind),
        }
    }
}

/// SDK failures use the OAuth 2.0 error body (RFC 6749 §5.2).
fn oauth_error_response(kind: SdkErrorKind) -> Response {
    let (status, error, description) = match kind {
        SdkErrorKind::UnknownProject => (
            StatusCode::NOT_FOUND,
            "invalid_client",
            "unknown public_key".to_string(),
        ),
        SdkErrorKind::Unprocessable(description) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request", description)
        }
        SdkErrorKind::InvalidRequest(description) => {
            (StatusCode::BAD_REQUEST, "invalid_request", description)
        }
        SdkErrorKind::InvalidGrant(description) => {
            (StatusCode::BAD_REQUEST, "invalid_grant", description)
        }
        SdkErrorKind::InvalidClient(description) => {
            (StatusCode::UNAUTHORIZED, "invalid_client", description)
        }
        SdkErrorKind::AccessDenied => (
            StatusCode::UNAUTHORIZED,
            "access_denied",
            "invalid email or password".to_string(),
        ),
        SdkErrorKind::Conflict(description) => {
            (StatusCode::CONFLICT, "invalid_request", description)
        }
        SdkErrorKind::InvalidToken => (
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "access token is missing, malformed or expired".to_string(),
        ),
    };

    let mut response = (
        status,
        Json(json!({ "error": error, "error_description": description })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if error == "invalid_token" {
        headers.insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer error=\"invalid_token\""),
        );
    }
    response
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
