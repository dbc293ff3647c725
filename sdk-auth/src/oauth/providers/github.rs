//! GitHub OAuth provider implementation.
//!
//! GitHub's OAuth apps do not speak OpenID Connect: the profile comes from the
//! REST API and the email verification status has to be read from
//! `/user/emails`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::ClientConfig;
use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::http;
use crate::oauth::token::{TokenResponse, Tokens};
use crate::oauth::{AuthorizationRequest, PkceChallenge, ProviderKind, UserInfo};

const SCOPES: &str = "read:user user:email";
const API_ACCEPT: &str = "application/vnd.github+json";

/// Configuration for GitHub OAuth URLs
#[derive(Debug, Clone)]
pub struct Urls {
    pub auth_url: String,
    pub token_url: String,
    /// Base of the REST API, e.g. `https://api.github.com`.
    pub api_url: String,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

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

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.urls.api_url.trim_end_matches('/'), path)
    }

    async fn fetch_emails(&self, access_token: &str) -> Result<Vec<GithubEmail>, Error> {
        let response = self
            .http_client
            .get(self.api("/user/emails"))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, API_ACCEPT)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("GitHub emails request failed with {}", response.status());
            return Ok(Vec::new());
        }
        Ok(response.json().await?)
    }
}

/// Prefers the primary verified address, then any verified one, then the
/// unverified public profile email.
fn choose_email(emails: &[GithubEmail], profile_email: Option<String>) -> Option<(String, bool)> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified))
        .map(|e| (e.email.clone(), true))
        .or_else(|| profile_email.map(|email| (email, false)))
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Github
    }

    fn authorization_url(
        &self,
        state: &str,
        _pkce_challenge: Option<&PkceChallenge>,
    ) -> Result<AuthorizationRequest, Error> {
        let mut url = Url::parse(&self.urls.auth_url)
            .map_err(|_| oauth_error(OAuthErrorKind::AuthorizationUrl, &self.urls.auth_url))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", SCOPES)
            .append_pair("state", state)
            .append_pair("allow_signup", "true");

        Ok(AuthorizationRequest {
            url: url.into(),
            state: state.to_string(),
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        _pkce_verifier: Option<&str>,
    ) -> Result<Tokens, Error> {
        let form = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        debug!("Exchanging GitHub OAuth code for tokens");

        let response = self
            .http_client
            .post(&self.urls.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("GitHub OAuth error: {}", error_text);
            return Err(oauth_error(OAuthErrorKind::TokenExchangeFailed, &error_text));
        }

        // GitHub answers 200 with an error body for bad or expired codes
        let body: TokenResponse = response.json().await?;
        if let Some(error) = body.error.as_deref() {
            let description = body.error_description.as_deref().unwrap_or(error);
            warn!("GitHub OAuth error: {}", description);
            return Err(oauth_error(OAuthErrorKind::TokenExchangeFailed, description));
        }

        match body.access_token.clone() {
            Some(access_token) => Ok(body.into_tokens(access_token)),
            None => Err(oauth_error(
                OAuthErrorKind::InvalidResponse,
                "GitHub token response had no access_token",
            )),
        }
    }

    async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .http_client
            .get(self.api("/user"))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, API_ACCEPT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("GitHub user request failed with {}", status);
            return Err(oauth_error(
                OAuthErrorKind::UserInfoFailed,
                &format!("GitHub user API returned {status}"),
            ));
        }

        let user: GithubUser = response.json().await?;
        let emails = self.fetch_emails(access_token).await?;
        let (email, email_verified) = choose_email(&emails, user.email).ok_or_else(|| {
            oauth_error(OAuthErrorKind::MissingEmail, "GitHub account has no email")
        })?;

        Ok(UserInfo {
            id: user.id.to_string(),
            email,
            name: user.name.or(Some(user.login)),
            picture: user.avatar_url,
            email_verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::oauth::Provider as _;

    fn provider(server_url: &str) -> Provider {
        Provider::new(
            ClientConfig {
                client_id: "github-client".to_string(),
                client_secret: "github-secret".to_string(),
                redirect_uri: "http://localhost:4000/sdk/callback/github".to_string(),
            },
            Urls {
                auth_url: format!("{server_url}/login/oauth/authorize"),
                token_url: format!("{server_url}/login/oauth/access_token"),
                api_url: server_url.to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn choose_email_prefers_primary_verified() {
        let emails = vec![
            GithubEmail {
                email: "old@example.com".to_string(),
                primary: false,
                verified: true,
            },
            GithubEmail {
                email: "main@example.com".to_string(),
                primary: true,
                verified: true,
            },
        ];
        assert_eq!(
            choose_email(&emails, None),
            Some(("main@example.com".to_string(), true))
        );
    }

    #[test]
    fn choose_email_falls_back_to_unverified_profile_email() {
        assert_eq!(
            choose_email(&[], Some("public@example.com".to_string())),
            Some(("public@example.com".to_string(), false))
        );
        assert_eq!(choose_email(&[], None), None);
    }

    #[tokio::test]
    async fn exchange_code_treats_error_body_as_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/login/oauth/access_token")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#)
            .create_async()
            .await;

        let err = provider(&server.url())
            .exchange_code("expired", None)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed)
        );
    }

    #[tokio::test]
    async fn get_user_info_reads_verified_email_from_emails_endpoint() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer gho_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":42,"login":"octocat","name":null,"email":null,"avatar_url":"https://avatars.example.com/42"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/user/emails")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"email":"octo@example.com","primary":true,"verified":true,"visibility":"private"}]"#)
            .create_async()
            .await;

        let info = provider(&server.url())
            .get_user_info("gho_token")
            .await
            .unwrap();

        assert_eq!(info.id, "42");
        assert_eq!(info.email, "octo@example.com");
        assert_eq!(info.name.as_deref(), Some("octocat"));
        assert!(info.email_verified);
    }
}
