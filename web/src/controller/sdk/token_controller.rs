use super::malformed_json;
use crate::extractors::bearer_token::BearerToken;
use crate::params::sdk::{Grant, RefreshTokenBody, TokenRequest, TokenResponse};
use crate::{AppState, Error};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use domain::token as TokenApi;

use log::*;

fn no_store(response: TokenResponse) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(response),
    )
}

/// POST redeem an authorization code or rotate a refresh token
#[utoipa::path(
    post,
    path = "/sdk/token",
    request_body = crate::params::sdk::TokenRequest,
    responses(
        (status = 200, description = "Access token and refresh token", body = crate::params::sdk::TokenResponse),
        (status = 400, description = "invalid_request or invalid_grant"),
        (status = 401, description = "invalid_client"),
    )
)]
pub async fn token(
    State(app_state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(request) = body.map_err(malformed_json)?;

    let pair = match Grant::from(request) {
        Grant::AuthorizationCode(grant) => {
            TokenApi::exchange_code(app_state.db_conn_ref(), &app_state.config, grant).await?
        }
        Grant::RefreshToken(grant) => {
            TokenApi::refresh(app_state.db_conn_ref(), &app_state.config, grant).await?
        }
    };

    Ok(no_store(pair.into()))
}

/// POST rotate a refresh token
#[utoipa::path(
    post,
    path = "/sdk/refresh",
    request_body = crate::params::sdk::RefreshTokenBody,
    responses(
        (status = 200, description = "Fresh access token and the successor refresh token", body = crate::params::sdk::TokenResponse),
        (status = 400, description = "invalid_grant"),
        (status = 401, description = "invalid_client"),
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    body: Result<Json<RefreshTokenBody>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(grant) = body.map_err(malformed_json)?;

    let pair =
        TokenApi::refresh(app_state.db_conn_ref(), &app_state.config, grant.into()).await?;

    Ok(no_store(pair.into()))
}

/// POST sign an end user out by revoking their refresh token family
#[utoipa::path(
    post,
    path = "/sdk/revoke",
    request_body = crate::params::sdk::RefreshTokenBody,
    responses(
        (status = 200, description = "Token revoked, or it was not known"),
        (status = 401, description = "invalid_client"),
    )
)]
pub async fn revoke(
    State(app_state): State<AppState>,
    body: Result<Json<RefreshTokenBody>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(grant) = body.map_err(malformed_json)?;

    TokenApi::revoke(app_state.db_conn_ref(), grant.into()).await?;

    Ok(StatusCode::OK)
}

/// GET the profile of the end user an access token was issued to
#[utoipa::path(
    get,
    path = "/sdk/userinfo",
    responses(
        (status = 200, description = "Project user profile", body = domain::project_users::Model),
        (status = 401, description = "invalid_token"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn user_info(
    State(app_state): State<AppState>,
    BearerToken(access_token): BearerToken,
) -> Result<impl IntoResponse, Error> {
    let user =
        TokenApi::user_info(app_state.db_conn_ref(), &app_state.config, &access_token).await?;

    Ok(Json(user))
}
