//! Claims carried by SDK access tokens.

use serde::{Deserialize, Serialize};

/// Claims of an access token issued to an SDK client.
///
/// `sub` is the project user id and `aud` the project's public key, so a client
/// can check a token was minted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    /// Project id
    pub pid: String,
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub email: String,
}
