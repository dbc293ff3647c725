//! The front half of the SDK sign-in flow: everything up to the point where the
//! client holds an authorization code.
//!
//! An SDK client starts at `authorize`, which records an authorization request
//! and sends the browser either to the hosted login page (`local`) or to a social
//! provider. The request is completed by `login`/`register` or by
//! `social_callback`, each of which binds a project user to the request, issues
//! a single-use code and hands back the client's redirect URL.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind, SdkErrorKind};
use crate::gateway::oauth::{
    self, opaque, ChallengeMethod, PkceChallenge, PkceVerifier, Provider as _,
};
use crate::provider::Provider;
use crate::{authorization_requests, authorization_status::AuthorizationStatus, project_users, Id};
use chrono::{Duration, Utc};
use entity_api::authorization_request::{self, NewAuthorizationRequest};
use entity_api::error::EntityApiErrorKind;
use entity_api::project_user::{self, NewProjectUser};
use log::*;
use sea_orm::DatabaseConnection;
use secrecy::ExposeSecret;
use serde::Deserialize;
use service::config::Config;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

pub const MAX_STATE_LEN: usize = 512;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Query of `GET /sdk/authorize`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeParams {
    pub public_key: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: Option<String>,
    pub provider: Option<String>,
    pub state: Option<String>,
}

/// Credentials typed into the hosted login page.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalSignIn {
    pub request_id: Id,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// What a social provider sends back to `/sdk/callback/{provider}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Starts a sign-in. Returns the URL to redirect the browser to.
pub async fn authorize(
    db: &DatabaseConnection,
    config: &Config,
    params: AuthorizeParams,
) -> Result<String, Error> {
    let method = ChallengeMethod::from_str(
        params
            .code_challenge_method
            .as_deref()
            .unwrap_or(ChallengeMethod::default().as_str()),
    )?;
    let challenge = PkceChallenge::parse(&params.code_challenge)?;

    let provider = match params.provider.as_deref() {
        None | Some("") => Provider::Local,
        Some(name) => Provider::from_str(name).map_err(|_| {
            Error::sdk(SdkErrorKind::InvalidRequest(format!(
                "unsupported provider {name}"
            )))
        })?,
    };

    if let Some(state) = params.state.as_deref() {
        if state.chars().count() > MAX_STATE_LEN {
            return Err(Error::sdk(SdkErrorKind::InvalidRequest(format!(
                "state must be at most {MAX_STATE_LEN} characters"
            ))));
        }
    }

    if Url::parse(&params.redirect_uri).is_err() {
        return Err(Error::sdk(SdkErrorKind::InvalidRequest(
            "redirect_uri must be an absolute URL".to_string(),
        )));
    }

    let project = crate::project::find_by_public_key(db, &params.public_key).await?;

    if !project.is_active {
        return Err(Error::sdk(SdkErrorKind::Unprocessable(
            "project is disabled".to_string(),
        )));
    }
    if !project.allows_redirect_uri(&params.redirect_uri) {
        warn!(
            "Rejected unregistered redirect_uri for project {}",
            project.id
        );
        return Err(Error::sdk(SdkErrorKind::Unprocessable(
            "redirect_uri is not registered for this project".to_string(),
        )));
    }
    if !project.allows_provider(provider) {
        return Err(Error::sdk(SdkErrorKind::Unprocessable(format!(
            "{provider} sign-in is not enabled for this project"
        ))));
    }

    // Resolve the social client before persisting anything so a platform
    // misconfiguration leaves no dangling request behind.
    let social = if provider.is_social() {
        let client = oauth::provider_for(config, provider)?;
        let verifier = client.supports_pkce().then(PkceVerifier::generate);
        Some((client, verifier))
    } else {
        None
    };

    let request = authorization_request::create(
        db,
        NewAuthorizationRequest {
            project_id: project.id,
            redirect_uri: params.redirect_uri,
            provider,
            code_challenge: challenge.as_str().to_string(),
            code_challenge_method: method.as_str().to_string(),
            state: params.state.filter(|s| !s.is_empty()),
            provider_code_verifier: social
                .as_ref()
                .and_then(|(_, verifier)| verifier.as_ref())
                .map(|verifier| verifier.as_str().to_string()),
            expires_at: Utc::now() + Duration::seconds(config.sdk_request_ttl_secs),
        },
    )
    .await?;

    match social {
        Some((client, verifier)) => {
            let provider_challenge = verifier.as_ref().map(PkceVerifier::challenge);
            let redirect =
                client.authorization_url(&request.id.to_string(), provider_challenge.as_ref())?;
            debug!("Sending authorization request {} to {provider}", request.id);
            Ok(redirect.url)
        }
        None => {
            let mut url = Url::parse(config.hosted_login_url()).map_err(|err| {
                warn!("hosted_login_url is not a valid URL: {err}");
                Error::config()
            })?;
            url.query_pairs_mut()
                .append_pair("request_id", &request.id.to_string());
            Ok(url.into())
        }
    }
}

/// Signs an existing project user in on the hosted login page.
pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    params: LocalSignIn,
) -> Result<String, Error> {
    let request = find_pending(db, params.request_id, Provider::Local).await?;

    let user = project_user::find_by_email(db, request.project_id, &params.email)
        .await?
        .ok_or_else(|| Error::sdk(SdkErrorKind::AccessDenied))?;

    project_user::verify_password(&user, &params.password).map_err(|_| {
        debug!("Failed local sign-in for project {}", request.project_id);
        Error::sdk(SdkErrorKind::AccessDenied)
    })?;

    let user = project_user::record_login(db, user).await?;
    complete(db, config, request, &user).await
}

/// Creates a new local project user from the hosted sign-up page and signs them in.
pub async fn register(
    db: &DatabaseConnection,
    config: &Config,
    params: LocalSignIn,
) -> Result<String, Error> {
    let request = find_pending(db, params.request_id, Provider::Local).await?;

    let email = params.email.trim();
    if !email_address::EmailAddress::is_valid(email) {
        return Err(Error::sdk(SdkErrorKind::InvalidRequest(
            "email is not a valid address".to_string(),
        )));
    }
    if params.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::sdk(SdkErrorKind::InvalidRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))));
    }

    if project_user::find_by_email(db, request.project_id, email)
        .await?
        .is_some()
    {
        return Err(Error::sdk(SdkErrorKind::Conflict(
            "email is already registered".to_string(),
        )));
    }

    let user = project_user::create(
        db,
        NewProjectUser {
            project_id: request.project_id,
            email: email.to_string(),
            name: params.name.filter(|n| !n.trim().is_empty()),
            password: Some(params.password),
            provider: Provider::Local,
            provider_account_id: None,
            avatar_url: None,
            email_verified: false,
        },
    )
    .await
    .map_err(|err| match err.error_kind {
        EntityApiErrorKind::RecordAlreadyExists => Error::sdk(SdkErrorKind::Conflict(
            "email is already registered".to_string(),
        )),
        _ => err.into(),
    })?;

    info!(
        "Registered project user {} for project {}",
        user.id, request.project_id
    );
    complete(db, config, request, &user).await
}

/// Finishes a social sign-in. Returns the URL to redirect the browser to.
///
/// Once the authorization request is known every failure is reported to the
/// client through its redirect URI, as OAuth clients expect.
pub async fn social_callback(
    db: &DatabaseConnection,
    config: &Config,
    provider_name: &str,
    params: CallbackParams,
) -> Result<String, Error> {
    let provider = Provider::from_str(provider_name)
        .ok()
        .filter(Provider::is_social)
        .ok_or_else(|| {
            Error::sdk(SdkErrorKind::InvalidRequest(format!(
                "unsupported provider {provider_name}"
            )))
        })?;

    let request_id = params
        .state
        .as_deref()
        .and_then(|state| Id::parse_str(state).ok())
        .ok_or_else(|| {
            Error::sdk(SdkErrorKind::InvalidRequest(
                "state is missing or malformed".to_string(),
            ))
        })?;

    let request = find_pending(db, request_id, provider).await?;

    if let Some(error) = params.error.as_deref() {
        info!("{provider} reported {error} for authorization request {request_id}");
        return error_redirect(&request, "access_denied");
    }

    let Some(code) = params.code.as_deref() else {
        return error_redirect(&request, "invalid_request");
    };

    match upsert_social_user(db, config, provider, &request, code).await {
        Ok(user) => complete(db, config, request, &user).await,
        Err(err) => {
            warn!("{provider} sign-in failed for authorization request {request_id}: {err}");
            error_redirect(&request, callback_error_code(&err))
        }
    }
}

/// Deletes authorization requests that can no longer be used.
pub async fn purge_expired_requests(db: &DatabaseConnection) -> Result<u64, Error> {
    Ok(authorization_request::delete_expired(db, Utc::now()).await?)
}

/// Runs `purge_expired_requests` every `interval` until the runtime shuts down.
pub fn spawn_request_cleanup(
    db: Arc<DatabaseConnection>,
    interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match purge_expired_requests(&db).await {
                Ok(0) => {}
                Ok(count) => info!("Purged {count} expired authorization request(s)"),
                Err(err) => error!("Failed to purge expired authorization requests: {err}"),
            }
        }
    })
}

/// Loads a request that can still be completed with `provider`.
async fn find_pending(
    db: &DatabaseConnection,
    request_id: Id,
    provider: Provider,
) -> Result<authorization_requests::Model, Error> {
    let request = authorization_request::find_by_id(db, request_id)
        .await
        .map_err(|err| match err.error_kind {
            EntityApiErrorKind::RecordNotFound => Error::sdk(SdkErrorKind::InvalidRequest(
                "unknown authorization request".to_string(),
            )),
            _ => err.into(),
        })?;

    if request.status != AuthorizationStatus::Pending {
        return Err(Error::sdk(SdkErrorKind::InvalidRequest(
            "authorization request has already been completed".to_string(),
        )));
    }
    if request.expires_at < Utc::now() {
        return Err(Error::sdk(SdkErrorKind::InvalidRequest(
            "authorization request has expired".to_string(),
        )));
    }
    if request.provider != provider {
        return Err(Error::sdk(SdkErrorKind::InvalidRequest(format!(
            "authorization request was not started for {provider}"
        ))));
    }

    Ok(request)
}

async fn upsert_social_user(
    db: &DatabaseConnection,
    config: &Config,
    provider: Provider,
    request: &authorization_requests::Model,
    code: &str,
) -> Result<project_users::Model, Error> {
    let client = oauth::provider_for(config, provider)?;
    let tokens = client
        .exchange_code(code, request.provider_code_verifier.as_deref())
        .await?;
    let profile = client
        .get_user_info(tokens.access_token.expose_secret())
        .await?;

    if let Some(user) =
        project_user::find_by_provider_account(db, request.project_id, provider, &profile.id)
            .await?
    {
        return Ok(project_user::record_login(db, user).await?);
    }

    if let Some(user) = project_user::find_by_email(db, request.project_id, &profile.email).await? {
        if !profile.email_verified {
            return Err(Error::sdk(SdkErrorKind::Conflict(format!(
                "{provider} did not verify the email of an existing account"
            ))));
        }
        let user =
            project_user::link_provider(db, user, provider, profile.id, profile.picture).await?;
        return Ok(project_user::record_login(db, user).await?);
    }

    let user = project_user::create(
        db,
        NewProjectUser {
            project_id: request.project_id,
            email: profile.email,
            name: profile.name,
            password: None,
            provider,
            provider_account_id: Some(profile.id),
            avatar_url: profile.picture,
            email_verified: profile.email_verified,
        },
    )
    .await?;
    info!(
        "Created {provider} project user {} for project {}",
        user.id, request.project_id
    );
    Ok(project_user::record_login(db, user).await?)
}

/// Binds `user` to the request, issues the authorization code and builds the
/// client redirect carrying it.
async fn complete(
    db: &DatabaseConnection,
    config: &Config,
    request: authorization_requests::Model,
    user: &project_users::Model,
) -> Result<String, Error> {
    let code = opaque::generate(opaque::CODE_BYTES);
    let code_expires_at = Utc::now() + Duration::seconds(config.authorization_code_ttl_secs);

    let request = authorization_request::authorize(
        db,
        request,
        user.id,
        opaque::digest(&code),
        code_expires_at,
    )
    .await
    .map_err(|err| match err.error_kind {
        EntityApiErrorKind::RecordNotUpdated => Error::sdk(SdkErrorKind::InvalidRequest(
            "authorization request has already been completed".to_string(),
        )),
        _ => err.into(),
    })?;

    client_redirect(&request, &[("code", code.as_str())])
}

fn error_redirect(request: &authorization_requests::Model, error: &str) -> Result<String, Error> {
    client_redirect(request, &[("error", error)])
}

/// Appends `pairs` and the client's state to the registered redirect URI.
fn client_redirect(
    request: &authorization_requests::Model,
    pairs: &[(&str, &str)],
) -> Result<String, Error> {
    let mut url = Url::parse(&request.redirect_uri).map_err(|err| Error {
        source: Some(Box::new(err)),
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
            "stored redirect_uri is not a valid URL".to_string(),
        )),
    })?;

    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
        if let Some(state) = request.state.as_deref() {
            query.append_pair("state", state);
        }
    }

    Ok(url.into())
}

fn callback_error_code(err: &Error) -> &'static str {
    match &err.error_kind {
        DomainErrorKind::Sdk(_) => "access_denied",
        DomainErrorKind::External(ExternalErrorKind::Network) => "temporarily_unavailable",
        DomainErrorKind::External(_) => "access_denied",
        DomainErrorKind::Internal(_) => "server_error",
    }
}
