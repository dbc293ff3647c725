//! PKCE (Proof Key for Code Exchange) support for OAuth 2.0.
//!
//! Implements RFC 7636 in both directions: generating verifiers when we act as a
//! client of a social provider, and checking verifiers presented by SDK clients
//! against the challenge they sent to `/sdk/authorize`.
//!
//! Only the `S256` method is supported.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{pkce_error, Error, PkceErrorKind};

/// RFC 7636 §4.1 bounds on verifier length.
pub const VERIFIER_MIN_LEN: usize = 43;
pub const VERIFIER_MAX_LEN: usize = 128;

/// A base64url encoded SHA-256 digest without padding is always this long.
pub const CHALLENGE_LEN: usize = 43;

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

/// PKCE code verifier (random string).
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Generate a new random PKCE verifier from 32 random bytes (43 characters).
    pub fn generate() -> Self {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        Self(URL_SAFE_NO_PAD.encode(random_bytes))
    }

    /// Wraps a verifier we generated earlier and stored, without validation.
    pub fn from_string(verifier: String) -> Self {
        Self(verifier)
    }

    /// Validates a verifier received from a client.
    ///
    /// It must be 43 to 128 characters from the unreserved set `[A-Za-z0-9-._~]`.
    pub fn parse(verifier: &str) -> Result<Self, Error> {
        let len = verifier.chars().count();
        if !(VERIFIER_MIN_LEN..=VERIFIER_MAX_LEN).contains(&len) {
            return Err(pkce_error(
                PkceErrorKind::InvalidVerifier,
                "code_verifier must be between 43 and 128 characters",
            ));
        }
        if !verifier.chars().all(is_unreserved) {
            return Err(pkce_error(
                PkceErrorKind::InvalidVerifier,
                "code_verifier contains characters outside [A-Za-z0-9-._~]",
            ));
        }
        Ok(Self(verifier.to_string()))
    }

    /// Get the verifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate the corresponding code challenge.
    pub fn challenge(&self) -> PkceChallenge {
        PkceChallenge::from_verifier(self)
    }
}

/// PKCE code challenge (SHA256 hash of verifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Create a code challenge from a verifier.
    ///
    /// Uses SHA256 hashing and base64url encoding as per RFC 7636.
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_str().as_bytes());
        let hash = hasher.finalize();
        Self(URL_SAFE_NO_PAD.encode(hash))
    }

    /// Validates a challenge received from a client. An `S256` challenge is the
    /// unpadded base64url form of a 32 byte digest.
    pub fn parse(challenge: &str) -> Result<Self, Error> {
        let decodes_to_digest = URL_SAFE_NO_PAD
            .decode(challenge)
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false);

        if challenge.len() != CHALLENGE_LEN || !decodes_to_digest {
            return Err(pkce_error(
                PkceErrorKind::InvalidChallenge,
                "code_challenge must be a base64url encoded SHA-256 digest",
            ));
        }
        Ok(Self(challenge.to_string()))
    }

    /// Get the challenge string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `BASE64URL(SHA256(verifier)) == challenge`.
    pub fn is_satisfied_by(&self, verifier: &PkceVerifier) -> bool {
        verifier.challenge() == *self
    }
}

/// Code challenge transformation method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChallengeMethod {
    #[default]
    S256,
}

impl ChallengeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeMethod::S256 => "S256",
        }
    }
}

impl fmt::Display for ChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S256" => Ok(ChallengeMethod::S256),
            _ => Err(pkce_error(
                PkceErrorKind::UnsupportedMethod,
                "only the S256 code_challenge_method is supported",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    // RFC 7636 Appendix B
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn test_pkce_verifier_generation() {
        let verifier = PkceVerifier::generate();
        assert_eq!(verifier.as_str().len(), 43);
        assert!(PkceVerifier::parse(verifier.as_str()).is_ok());
    }

    #[test]
    fn test_challenge_matches_rfc_vector() {
        let verifier = PkceVerifier::parse(RFC_VERIFIER).unwrap();
        assert_eq!(verifier.challenge().as_str(), RFC_CHALLENGE);
    }

    #[test]
    fn test_challenge_is_satisfied_by_matching_verifier() {
        let challenge = PkceChallenge::parse(RFC_CHALLENGE).unwrap();
        let verifier = PkceVerifier::parse(RFC_VERIFIER).unwrap();
        assert!(challenge.is_satisfied_by(&verifier));

        let other = PkceVerifier::generate();
        assert!(!challenge.is_satisfied_by(&other));
    }

    #[test]
    fn test_verifier_length_bounds() {
        assert!(PkceVerifier::parse(&"a".repeat(42)).is_err());
        assert!(PkceVerifier::parse(&"a".repeat(43)).is_ok());
        assert!(PkceVerifier::parse(&"a".repeat(128)).is_ok());
        assert!(PkceVerifier::parse(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_verifier_rejects_reserved_characters() {
        let verifier = format!("{}+/=", "a".repeat(43));
        let err = PkceVerifier::parse(&verifier).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Pkce(PkceErrorKind::InvalidVerifier)
        );
    }

    #[test]
    fn test_challenge_rejects_wrong_shape() {
        assert!(PkceChallenge::parse("short").is_err());
        assert!(PkceChallenge::parse(&format!("{RFC_CHALLENGE}A")).is_err());
        assert!(PkceChallenge::parse(&RFC_CHALLENGE.replace('-', "+")).is_err());
    }

    #[test]
    fn test_only_s256_is_supported() {
        assert_eq!("S256".parse::<ChallengeMethod>().unwrap(), ChallengeMethod::S256);
        assert!("plain".parse::<ChallengeMethod>().is_err());
        assert!("s256".parse::<ChallengeMethod>().is_err());
    }
}
