//! The back half of the SDK sign-in flow: trading codes and refresh tokens for
//! token pairs.
//!
//! Refresh tokens rotate. Each redemption of an authorization code starts a new
//! *family*; every refresh replaces the presented token with a successor in the
//! same family. Presenting a token that was already replaced means it leaked, so
//! the whole family is revoked.

use crate::error::{Error, SdkErrorKind};
use crate::gateway::oauth::{opaque, PkceChallenge, PkceVerifier};
use crate::{
    authorization_status::AuthorizationStatus, jwt, project, project_users, projects,
    refresh_tokens, Id,
};
use chrono::{Duration, Utc};
use entity_api::error::EntityApiErrorKind;
use entity_api::refresh_token::{self, NewRefreshToken};
use entity_api::{authorization_request, project_user};
use log::*;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use service::config::Config;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationCodeGrant {
    pub public_key: String,
    pub code: String,
    pub code_verifier: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenGrant {
    pub public_key: String,
    pub refresh_token: String,
}

/// Tokens handed to an SDK client after a successful grant.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub refresh_token: String,
    pub user: project_users::Model,
}

impl TokenPair {
    fn new(
        access_token: String,
        expires_in: i64,
        refresh_token: String,
        user: project_users::Model,
    ) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE,
            expires_in,
            refresh_token,
            user,
        }
    }
}

/// Redeems an authorization code.
pub async fn exchange_code(
    db: &DatabaseConnection,
    config: &Config,
    grant: AuthorizationCodeGrant,
) -> Result<TokenPair, Error> {
    let verifier = PkceVerifier::parse(&grant.code_verifier)?;
    let project = find_client(db, &grant.public_key).await?;

    let request = authorization_request::find_by_code_hash(db, &opaque::digest(&grant.code))
        .await?
        .ok_or_else(|| invalid_grant("authorization code is invalid"))?;

    if request.project_id != project.id || request.redirect_uri != grant.redirect_uri {
        return Err(invalid_grant(
            "authorization code was not issued for this client and redirect_uri",
        ));
    }

    if request.status == AuthorizationStatus::Redeemed {
        let revoked = refresh_token::revoke_by_authorization_request(db, request.id).await?;
        warn!(
            "Authorization code for request {} replayed; revoked {revoked} refresh token(s)",
            request.id
        );
        return Err(invalid_grant("authorization code has already been used"));
    }

    let not_expired = request
        .code_expires_at
        .map(|expires_at| expires_at > Utc::now())
        .unwrap_or(false);
    if request.status != AuthorizationStatus::Authorized || !not_expired {
        return Err(invalid_grant("authorization code has expired"));
    }

    let challenge = PkceChallenge::parse(&request.code_challenge)?;
    if !challenge.is_satisfied_by(&verifier) {
        return Err(invalid_grant("code_verifier does not match code_challenge"));
    }

    let project_user_id = request
        .project_user_id
        .ok_or_else(|| invalid_grant("authorization code is invalid"))?;
    let user = project_user::find_by_id(db, project_user_id).await?;
    // signed up front so a signing failure leaves the code redeemable
    let (access_token, expires_in) = jwt::issue_access_token(config, &project, &user)?;

    let request_id = request.id;
    let txn = db.begin().await.map_err(entity_api::error::Error::from)?;
    authorization_request::mark_redeemed(&txn, request)
        .await
        .map_err(|err| match err.error_kind {
            // lost a race with a concurrent redemption of the same code
            EntityApiErrorKind::RecordNotUpdated => {
                invalid_grant("authorization code has already been used")
            }
            _ => err.into(),
        })?;

    let refresh_token = opaque::generate(opaque::REFRESH_TOKEN_BYTES);
    refresh_token::create(
        &txn,
        NewRefreshToken {
            project_id: project.id,
            project_user_id: user.id,
            authorization_request_id: Some(request_id),
            family_id: Id::new_v4(),
            token_hash: opaque::digest(&refresh_token),
            expires_at: refresh_expiry(config),
        },
    )
    .await?;
    txn.commit().await.map_err(entity_api::error::Error::from)?;

    info!(
        "Redeemed authorization code of request {request_id} for project user {}",
        user.id
    );
    Ok(TokenPair::new(access_token, expires_in, refresh_token, user))
}

/// Rotates a refresh token.
pub async fn refresh(
    db: &DatabaseConnection,
    config: &Config,
    grant: RefreshTokenGrant,
) -> Result<TokenPair, Error> {
    let project = find_client(db, &grant.public_key).await?;

    let current = refresh_token::find_by_hash(db, &opaque::digest(&grant.refresh_token))
        .await?
        .ok_or_else(|| invalid_grant("refresh token is invalid"))?;

    if current.project_id != project.id {
        return Err(invalid_grant("refresh token was not issued for this client"));
    }

    if current.is_revoked() {
        revoke_reused_family(db, &current).await?;
        return Err(invalid_grant("refresh token has been revoked"));
    }

    if current.expires_at < Utc::now() {
        return Err(invalid_grant("refresh token has expired"));
    }

    let user = project_user::find_by_id(db, current.project_user_id).await?;
    let (access_token, expires_in) = jwt::issue_access_token(config, &project, &user)?;

    let successor_token = opaque::generate(opaque::REFRESH_TOKEN_BYTES);
    let family = current.clone();
    match refresh_token::rotate(
        db,
        current,
        opaque::digest(&successor_token),
        refresh_expiry(config),
    )
    .await
    {
        Ok(successor) => {
            debug!(
                "Rotated refresh token in family {} to {}",
                successor.family_id, successor.id
            );
        }
        Err(err) if err.error_kind == EntityApiErrorKind::RecordNotUpdated => {
            // another request rotated the same token first
            revoke_reused_family(db, &family).await?;
            return Err(invalid_grant("refresh token has been revoked"));
        }
        Err(err) => return Err(err.into()),
    }

    Ok(TokenPair::new(access_token, expires_in, successor_token, user))
}

/// Signs a project user out by revoking the refresh token's family.
///
/// Unknown tokens are not an error (RFC 7009 §2.2); an unknown client is.
pub async fn revoke(db: &DatabaseConnection, grant: RefreshTokenGrant) -> Result<(), Error> {
    let project = find_client(db, &grant.public_key).await?;

    match refresh_token::find_by_hash(db, &opaque::digest(&grant.refresh_token)).await? {
        Some(token) if token.project_id == project.id => {
            let revoked = refresh_token::revoke_family(db, token.family_id).await?;
            info!(
                "Signed out project user {}; revoked {revoked} refresh token(s)",
                token.project_user_id
            );
        }
        _ => debug!("Ignoring revocation of an unknown refresh token"),
    }

    Ok(())
}

/// Resolves the project user an access token was issued to.
pub async fn user_info(
    db: &DatabaseConnection,
    config: &Config,
    access_token: &str,
) -> Result<project_users::Model, Error> {
    let claims = jwt::decode_access_token(config, access_token)?;
    let user_id =
        Id::parse_str(&claims.sub).map_err(|_| Error::sdk(SdkErrorKind::InvalidToken))?;

    let user = project_user::find_by_id(db, user_id)
        .await
        .map_err(|err| match err.error_kind {
            EntityApiErrorKind::RecordNotFound => Error::sdk(SdkErrorKind::InvalidToken),
            _ => err.into(),
        })?;

    if user.project_id.to_string() != claims.pid {
        return Err(Error::sdk(SdkErrorKind::InvalidToken));
    }
    Ok(user)
}

/// Resolves the calling SDK client by public key. Clients are public, so the key
/// is the only identification they present.
async fn find_client(db: &DatabaseConnection, public_key: &str) -> Result<projects::Model, Error> {
    let project = project::find_by_public_key(db, public_key)
        .await
        .map_err(|err| match err.error_kind {
            crate::error::DomainErrorKind::Sdk(SdkErrorKind::UnknownProject) => Error::sdk(
                SdkErrorKind::InvalidClient("unknown public_key".to_string()),
            ),
            _ => err,
        })?;

    if !project.is_active {
        return Err(Error::sdk(SdkErrorKind::InvalidClient(
            "project is disabled".to_string(),
        )));
    }
    Ok(project)
}

async fn revoke_reused_family(
    db: &DatabaseConnection,
    token: &refresh_tokens::Model,
) -> Result<(), Error> {
    let revoked = refresh_token::revoke_family(db, token.family_id).await?;
    warn!(
        "Refresh token {} reused; revoked {revoked} token(s) in family {}",
        token.id, token.family_id
    );
    Ok(())
}

fn refresh_expiry(config: &Config) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::seconds(config.refresh_token_ttl_secs)
}

fn invalid_grant(description: &str) -> Error {
    Error::sdk(SdkErrorKind::InvalidGrant(description.to_string()))
}
