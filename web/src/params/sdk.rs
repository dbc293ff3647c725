//! Request and response bodies of the `/sdk` endpoints.

use domain::authorization::{AuthorizeParams, CallbackParams, LocalSignIn};
use domain::token::{AuthorizationCodeGrant, RefreshTokenGrant, TokenPair};
use domain::{project_users, Id};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct AuthorizeQuery {
    /// Public key of the project the SDK belongs to.
    pub public_key: String,
    /// Must exactly match one of the project's registered redirect URIs.
    pub redirect_uri: String,
    /// BASE64URL(SHA256(code_verifier)), 43 characters.
    pub code_challenge: String,
    /// Only `S256` is accepted.
    pub code_challenge_method: Option<String>,
    /// `local` (default), `google` or `github`.
    pub provider: Option<String>,
    /// Opaque value echoed back on the final redirect.
    pub state: Option<String>,
}

impl From<AuthorizeQuery> for AuthorizeParams {
    fn from(query: AuthorizeQuery) -> Self {
        AuthorizeParams {
            public_key: query.public_key,
            redirect_uri: query.redirect_uri,
            code_challenge: query.code_challenge,
            code_challenge_method: query.code_challenge_method,
            provider: query.provider,
            state: query.state,
        }
    }
}

/// Credentials posted by the hosted login page.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct LocalSignInBody {
    #[schema(value_type = String, format = Uuid)]
    pub request_id: Id,
    pub email: String,
    pub password: String,
    /// Display name, only used on registration.
    pub name: Option<String>,
}

impl From<LocalSignInBody> for LocalSignIn {
    fn from(body: LocalSignInBody) -> Self {
        LocalSignIn {
            request_id: body.request_id,
            email: body.email,
            password: body.password,
            name: body.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct RedirectBody {
    /// Client redirect URI carrying `code` and `state`.
    pub redirect_url: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct CallbackQuery {
    pub code: Option<String>,
    /// The authorization request id handed to the provider.
    pub state: Option<String>,
    pub error: Option<String>,
}

impl From<CallbackQuery> for CallbackParams {
    fn from(query: CallbackQuery) -> Self {
        CallbackParams {
            code: query.code,
            state: query.state,
            error: query.error,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct RefreshTokenBody {
    pub public_key: String,
    pub refresh_token: String,
}

impl From<RefreshTokenBody> for RefreshTokenGrant {
    fn from(body: RefreshTokenBody) -> Self {
        RefreshTokenGrant {
            public_key: body.public_key,
            refresh_token: body.refresh_token,
        }
    }
}

/// Body of `POST /sdk/token`, discriminated by `grant_type`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub(crate) enum TokenRequest {
    AuthorizationCode {
        public_key: String,
        code: String,
        code_verifier: String,
        redirect_uri: String,
    },
    RefreshToken {
        public_key: String,
        refresh_token: String,
    },
}

/// The grant a token request asks for, in domain terms.
pub(crate) enum Grant {
    AuthorizationCode(AuthorizationCodeGrant),
    RefreshToken(RefreshTokenGrant),
}

impl From<TokenRequest> for Grant {
    fn from(request: TokenRequest) -> Self {
        match request {
            TokenRequest::AuthorizationCode {
                public_key,
                code,
                code_verifier,
                redirect_uri,
            } => Grant::AuthorizationCode(AuthorizationCodeGrant {
                public_key,
                code,
                code_verifier,
                redirect_uri,
            }),
            TokenRequest::RefreshToken {
                public_key,
                refresh_token,
            } => Grant::RefreshToken(RefreshTokenGrant {
                public_key,
                refresh_token,
            }),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    pub refresh_token: String,
    #[schema(value_type = domain::project_users::Model)]
    pub user: project_users::Model,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        TokenResponse {
            access_token: pair.access_token,
            token_type: pair.token_type.to_string(),
            expires_in: pair.expires_in,
            refresh_token: pair.refresh_token,
            user: pair.user,
        }
    }
}
