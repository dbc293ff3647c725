//! # sdk-auth
//!
//! OAuth building blocks for the SDK sign-in flow:
//! - PKCE (RFC 7636) challenge parsing and verifier checking
//! - opaque token generation and digests for codes and refresh tokens
//! - social identity providers (Google, GitHub) the hosted flow can delegate to
//!
//! Nothing here touches the database. Persistence and the flow itself live in
//! the `domain` crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sdk_auth::oauth::{opaque, PkceChallenge, PkceVerifier};
//!
//! let challenge = PkceChallenge::parse(&params.code_challenge)?;
//! let verifier = PkceVerifier::parse(&body.code_verifier)?;
//! if !challenge.is_satisfied_by(&verifier) { /* invalid_grant */ }
//!
//! let code = opaque::generate(opaque::CODE_BYTES);
//! let stored = opaque::digest(&code);
//! ```

pub mod error;
pub mod http;
pub mod oauth;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
