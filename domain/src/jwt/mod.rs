//! Access tokens for SDK clients.
//!
//! Access tokens are HS256 JWTs signed with the platform's `jwt_signing_key`.
//! They are short lived; clients keep sessions alive with rotating refresh
//! tokens (see `crate::token`).
//!
//! # Example
//!
//! ```rust,ignore
//! let (token, expires_in) = domain::jwt::issue_access_token(config, &project, &project_user)?;
//! let claims = domain::jwt::decode_access_token(config, &token)?;
//! assert_eq!(claims.sub, project_user.id.to_string());
//! ```

use crate::error::{Error, SdkErrorKind};
use crate::{project_users, projects};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use service::config::Config;

pub use claims::AccessClaims;

mod claims;

fn signing_key(config: &Config) -> Result<String, Error> {
    config.jwt_signing_key().ok_or_else(|| {
        warn!("Failed to get JWT signing key from config");
        Error::config()
    })
}

/// Signs an access token for `project_user` of `project`. Returns the token and
/// its lifetime in seconds.
pub fn issue_access_token(
    config: &Config,
    project: &projects::Model,
    project_user: &project_users::Model,
) -> Result<(String, i64), Error> {
    let key = signing_key(config)?;
    let now = Utc::now();
    let ttl = config.access_token_ttl_secs;

    let claims = AccessClaims {
        sub: project_user.id.to_string(),
        pid: project.id.to_string(),
        aud: project.public_key.clone(),
        iss: config.token_issuer.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl)).timestamp(),
        email: project_user.email.clone(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key.as_bytes()),
    )?;

    Ok((token, ttl))
}

/// Verifies signature, expiry and issuer of an access token.
pub fn decode_access_token(config: &Config, token: &str) -> Result<AccessClaims, Error> {
    let key = signing_key(config)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.token_issuer.as_str()]);
    // The audience differs per project; callers compare `pid` instead.
    validation.validate_aud = false;
    validation.leeway = 0;

    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(key.as_bytes()), &validation)
        .map_err(|err| {
            debug!("Rejected access token: {err}");
            Error {
                source: Some(Box::new(err)),
                error_kind: crate::error::DomainErrorKind::Sdk(SdkErrorKind::InvalidToken),
            }
        })?;

    Ok(data.claims)
}
