//! OAuth 2.0 building blocks.
//!
//! PKCE and opaque token handling for the SDK flow, plus the social providers a
//! project can enable.

mod pkce;
mod provider;

pub mod opaque;
pub mod providers;
pub mod token;

pub use pkce::{ChallengeMethod, PkceChallenge, PkceVerifier};
pub use provider::{AuthorizationRequest, Provider, ProviderKind, UserInfo};
