//! Endpoints called by SDK clients and the hosted login page.

use crate::Error;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use domain::error::{Error as DomainError, SdkErrorKind};
use log::*;

pub(crate) mod authorization_controller;
pub(crate) mod token_controller;

/// SDK clients expect an OAuth `invalid_request` body for unreadable input, not
/// axum's plain-text rejection.
pub(crate) fn malformed_json(rejection: JsonRejection) -> Error {
    debug!("Rejected SDK request body: {rejection}");
    DomainError::sdk(SdkErrorKind::InvalidRequest(rejection.body_text())).into()
}

pub(crate) fn malformed_query(rejection: QueryRejection) -> Error {
    debug!("Rejected SDK query string: {rejection}");
    DomainError::sdk(SdkErrorKind::InvalidRequest(rejection.body_text())).into()
}
