//! OAuth provider trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::pkce::PkceChallenge;
use super::token::Tokens;
use crate::error::Error;

/// Social identity providers an end user can sign in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
    Github,
}

impl ProviderKind {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Github => "github",
        }
    }
}

/// Where to send the browser, and the state value the provider will echo back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// User information retrieved from OAuth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// Provider's unique user identifier.
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// User's profile picture URL.
    pub picture: Option<String>,
    /// Whether the provider vouches for the email address.
    pub email_verified: bool,
}

/// Trait for OAuth 2.0 providers.
///
/// Implementations handle the sign-in half of a provider's OAuth flow:
/// - Authorization URL generation with optional PKCE
/// - Authorization code exchange for tokens
/// - User profile retrieval
#[async_trait]
pub trait Provider: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Build the URL to send the user's browser to.
    ///
    /// # Arguments
    ///
    /// * `state` - Opaque value the provider must return on the callback
    /// * `pkce_challenge` - Challenge for a verifier kept on our side, if the provider supports PKCE
    fn authorization_url(
        &self,
        state: &str,
        pkce_challenge: Option<&PkceChallenge>,
    ) -> Result<AuthorizationRequest, Error>;

    /// Exchange the callback's authorization code for provider tokens.
    async fn exchange_code(&self, code: &str, pkce_verifier: Option<&str>)
        -> Result<Tokens, Error>;

    /// Fetch the signed-in user's profile with a provider access token.
    async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, Error>;

    /// Whether `authorization_url` should be given a PKCE challenge.
    fn supports_pkce(&self) -> bool {
        false
    }
}
