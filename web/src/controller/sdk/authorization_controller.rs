use super::{malformed_json, malformed_query};
use crate::params::sdk::{AuthorizeQuery, CallbackQuery, LocalSignInBody, RedirectBody};
use crate::{AppState, Error};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use domain::authorization as AuthorizationApi;

use log::*;

/// GET start a PKCE sign-in for an SDK client
///
/// Redirects the browser to the hosted login page, or straight to the social
/// provider when `provider` names one.
#[utoipa::path(
    get,
    path = "/sdk/authorize",
    params(AuthorizeQuery),
    responses(
        (status = 303, description = "Redirect to the hosted login page or the social provider"),
        (status = 400, description = "invalid_request"),
        (status = 404, description = "Unknown public_key"),
        (status = 422, description = "Redirect URI or provider not allowed for the project"),
    )
)]
pub async fn authorize(
    State(app_state): State<AppState>,
    query: Result<Query<AuthorizeQuery>, QueryRejection>,
) -> Result<impl IntoResponse, Error> {
    let Query(query) = query.map_err(malformed_query)?;
    debug!("GET authorize for project key {}", query.public_key);

    let location =
        AuthorizationApi::authorize(app_state.db_conn_ref(), &app_state.config, query.into())
            .await?;

    Ok(Redirect::to(&location))
}

/// POST sign an existing end user in from the hosted login page
#[utoipa::path(
    post,
    path = "/sdk/login",
    request_body = crate::params::sdk::LocalSignInBody,
    responses(
        (status = 200, description = "Where the hosted page should navigate next", body = crate::params::sdk::RedirectBody),
        (status = 400, description = "Authorization request unknown, expired or already used"),
        (status = 401, description = "Invalid email or password"),
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    body: Result<Json<LocalSignInBody>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(body) = body.map_err(malformed_json)?;

    let redirect_url =
        AuthorizationApi::login(app_state.db_conn_ref(), &app_state.config, body.into()).await?;

    Ok(Json(RedirectBody { redirect_url }))
}

/// POST create an end user from the hosted sign-up page and sign them in
#[utoipa::path(
    post,
    path = "/sdk/register",
    request_body = crate::params::sdk::LocalSignInBody,
    responses(
        (status = 200, description = "Where the hosted page should navigate next", body = crate::params::sdk::RedirectBody),
        (status = 400, description = "Invalid email, short password or unusable authorization request"),
        (status = 409, description = "Email already registered in the project"),
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    body: Result<Json<LocalSignInBody>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(body) = body.map_err(malformed_json)?;

    let redirect_url =
        AuthorizationApi::register(app_state.db_conn_ref(), &app_state.config, body.into())
            .await?;

    Ok(Json(RedirectBody { redirect_url }))
}

/// GET return point of every social provider
#[utoipa::path(
    get,
    path = "/sdk/callback/{provider}",
    params(
        ("provider" = String, Path, description = "google or github"),
        CallbackQuery
    ),
    responses(
        (status = 303, description = "Redirect to the client's redirect URI with code and state, or with an error"),
        (status = 400, description = "state missing, unknown or expired"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Result<impl IntoResponse, Error> {
    let Query(query) = query.map_err(malformed_query)?;

    let location = AuthorizationApi::social_callback(
        app_state.db_conn_ref(),
        &app_state.config,
        &provider,
        query.into(),
    )
    .await?;

    Ok(Redirect::to(&location))
}
