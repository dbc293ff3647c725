//! OAuth authentication gateway.
//!
//! Builds the social providers from platform configuration and re-exports the
//! `sdk-auth` types the domain works with.

use crate::error::Error;
use crate::provider::Provider as ProviderName;
use log::*;
use sdk_auth::oauth::providers::{github, google, ClientConfig};
use service::config::Config;

pub use sdk_auth::oauth::{
    opaque, token::Tokens, AuthorizationRequest, ChallengeMethod, PkceChallenge, PkceVerifier,
    Provider, ProviderKind, UserInfo,
};

/// Returns the configured client for a social provider.
///
/// Fails with a config error when the platform has no credentials for it, or when
/// asked for `local`, which has no external provider.
pub fn provider_for(config: &Config, name: ProviderName) -> Result<Box<dyn Provider>, Error> {
    let redirect_uri = config.social_callback_url(name.as_str());

    match name {
        ProviderName::Google => {
            let client = client_config(
                config.google_client_id(),
                config.google_client_secret(),
                redirect_uri,
                name,
            )?;
            let urls = google::Urls {
                auth_url: config.google_auth_url.clone(),
                token_url: config.google_token_url.clone(),
                userinfo_url: config.google_userinfo_url.clone(),
            };
            Ok(Box::new(google::Provider::new(client, urls)?))
        }
        ProviderName::Github => {
            let client = client_config(
                config.github_client_id(),
                config.github_client_secret(),
                redirect_uri,
                name,
            )?;
            let urls = github::Urls {
                auth_url: config.github_auth_url.clone(),
                token_url: config.github_token_url.clone(),
                api_url: config.github_api_url.clone(),
            };
            Ok(Box::new(github::Provider::new(client, urls)?))
        }
        ProviderName::Local => {
            warn!("No OAuth provider exists for local sign-in");
            Err(Error::config())
        }
    }
}

fn client_config(
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: String,
    name: ProviderName,
) -> Result<ClientConfig, Error> {
    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(ClientConfig {
            client_id,
            client_secret,
            redirect_uri,
        }),
        _ => {
            warn!("{name} sign-in is enabled on a project but the platform has no {name} credentials");
            Err(Error::config())
        }
    }
}
