//! Tokens returned by a social provider's token endpoint.

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::Deserialize;

/// Provider issued tokens. Only the access token is used, to fetch the profile.
#[derive(Debug, Clone)]
pub struct Tokens {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Token type (usually "Bearer").
    pub token_type: String,
    pub scopes: Vec<String>,
}

/// Wire shape of a standard OAuth token response. GitHub reports failures
/// with a 200 status and an `error` field, so that is captured as well.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// `scope` is space separated for Google and comma separated for GitHub.
    pub(crate) fn into_tokens(self, access_token: String) -> Tokens {
        let scopes = self
            .scope
            .map(|s| {
                s.split([' ', ','])
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Tokens {
            access_token: SecretString::new(access_token),
            refresh_token: self.refresh_token.map(SecretString::new),
            expires_at: self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scopes,
        }
    }
}
