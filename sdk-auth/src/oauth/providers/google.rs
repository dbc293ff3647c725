//! Google OAuth provider implementation.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::ClientConfig;
use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::http;
use crate::oauth::token::{TokenResponse, Tokens};
use crate::oauth::{AuthorizationRequest, PkceChallenge, ProviderKind, UserInfo};

const SCOPES: &str = "openid email profile";

/// Configuration for Google OAuth URLs
#[derive(Debug, Clone)]
pub struct Urls {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

/// OpenID Connect userinfo response.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

/// Google OAuth provider.
///
/// Uses Google's OpenID Connect endpoints, with PKCE on the leg between us and
/// Google.
pub struct Provider {
    config: ClientConfig,
    urls: Urls,
    http_client: reqwest::Client,
}

impl Provider {
    pub fn new(config: ClientConfig, urls: Urls) -> Result<Self, Error> {
        Ok(Self {
            config,
            urls,
            http_client: http::build_client()?,
        })
    }
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn authorization_url(
        &self,
        state: &str,
        pkce_challenge: Option<&PkceChallenge>,
    ) -> Result<AuthorizationRequest, Error> {
        let mut url = Url::parse(&self.urls.auth_url)
            .map_err(|_| oauth_error(OAuthErrorKind::AuthorizationUrl, &self.urls.auth_url))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", SCOPES)
                .append_pair("state", state);
            if let Some(challenge) = pkce_challenge {
                query
                    .append_pair("code_challenge", challenge.as_str())
                    .append_pair("code_challenge_method", "S256");
            }
        }

        Ok(AuthorizationRequest {
            url: url.into(),
            state: state.to_string(),
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: Option<&str>,
    ) -> Result<Tokens, Error> {
        let mut form = vec![
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        if let Some(verifier) = pkce_verifier {
            form.push(("code_verifier", verifier));
        }

        debug!("Exchanging Google OAuth code for tokens");

        let response = self
            .http_client
            .post(&self.urls.token_url)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Google OAuth error: {}", error_text);
            return Err(oauth_error(OAuthErrorKind::TokenExchangeFailed, &error_text));
        }

        let body: TokenResponse = response.json().await?;
        match body.access_token.clone() {
            Some(access_token) => Ok(body.into_tokens(access_token)),
            None => Err(oauth_error(
                OAuthErrorKind::InvalidResponse,
                "Google token response had no access_token",
            )),
        }
    }

    async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .http_client
            .get(&self.urls.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Google userinfo request failed with {}", status);
            return Err(oauth_error(
                OAuthErrorKind::UserInfoFailed,
                &format!("Google userinfo returned {status}"),
            ));
        }

        let info: GoogleUserInfo = response.json().await?;
        let email = info.email.ok_or_else(|| {
            oauth_error(OAuthErrorKind::MissingEmail, "Google account has no email")
        })?;

        Ok(UserInfo {
            id: info.sub,
            email,
            name: info.name,
            picture: info.picture,
            email_verified: info.email_verified,
        })
    }

    fn supports_pkce(&self) -> bool {
        true
    }
}
