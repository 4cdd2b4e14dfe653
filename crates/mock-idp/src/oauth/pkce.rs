//! PKCE (Proof Key for Code Exchange) verification.
//!
//! Implements both RFC 7636 challenge methods. Which of them a deployment
//! honours is decided by [`PkcePolicy`].

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ConfigError;

/// Relationship between a code verifier and its challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeMethod {
    /// `BASE64URL(SHA256(verifier))`
    #[serde(rename = "S256")]
    S256,
    /// The challenge is the verifier itself.
    #[serde(rename = "plain")]
    Plain,
}

impl ChallengeMethod {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for ChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `code_challenge_method` value that is neither `S256` nor `plain`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid code_challenge_method: \"{0}\". Expected \"S256\" or \"plain\".")]
pub struct UnknownChallengeMethod(pub String);

impl FromStr for ChallengeMethod {
    type Err = UnknownChallengeMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S256" => Ok(Self::S256),
            "plain" => Ok(Self::Plain),
            other => Err(UnknownChallengeMethod(other.to_string())),
        }
    }
}

/// Deployment choice of which challenge methods are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PkcePolicy {
    /// Accept both `S256` and `plain`.
    #[default]
    AllowPlain,
    /// Accept only `S256`; `plain` sessions fail at redemption.
    S256Only,
}

impl PkcePolicy {
    /// Returns true if sessions using `method` may be redeemed.
    #[must_use]
    pub const fn permits(self, method: ChallengeMethod) -> bool {
        match (self, method) {
            (_, ChallengeMethod::S256) => true,
            (Self::AllowPlain, ChallengeMethod::Plain) => true,
            (Self::S256Only, ChallengeMethod::Plain) => false,
        }
    }

    /// Methods advertised in the discovery document.
    #[must_use]
    pub const fn supported_methods(self) -> &'static [ChallengeMethod] {
        match self {
            Self::AllowPlain => &[ChallengeMethod::S256, ChallengeMethod::Plain],
            Self::S256Only => &[ChallengeMethod::S256],
        }
    }
}

impl FromStr for PkcePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow-plain" | "allow_plain" => Ok(Self::AllowPlain),
            "s256-only" | "s256_only" => Ok(Self::S256Only),
            _ => Err(ConfigError::InvalidPkcePolicy(s.to_string())),
        }
    }
}

/// Derive the `S256` challenge for a verifier.
#[must_use]
pub fn s256_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

/// Verify a presented code verifier against the stored challenge.
pub fn verify(method: ChallengeMethod, code_challenge: &str, code_verifier: &str) -> bool {
    match method {
        ChallengeMethod::Plain => code_challenge.as_bytes() == code_verifier.as_bytes(),
        ChallengeMethod::S256 => s256_challenge(code_verifier) == code_challenge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7636 Appendix B test vector
    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn test_s256_valid() {
        assert!(verify(ChallengeMethod::S256, CHALLENGE, VERIFIER));
        assert_eq!(s256_challenge(VERIFIER), CHALLENGE);
    }

    #[test]
    fn test_s256_invalid_verifier() {
        assert!(!verify(ChallengeMethod::S256, CHALLENGE, "wrong-verifier"));
    }

    #[test]
    fn test_s256_does_not_accept_verifier_as_challenge() {
        assert!(!verify(ChallengeMethod::S256, VERIFIER, VERIFIER));
    }

    #[test]
    fn test_plain() {
        assert!(verify(ChallengeMethod::Plain, "abc", "abc"));
        assert!(!verify(ChallengeMethod::Plain, "abc", "abd"));
        assert!(!verify(ChallengeMethod::Plain, CHALLENGE, VERIFIER));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("S256".parse::<ChallengeMethod>(), Ok(ChallengeMethod::S256));
        assert_eq!("plain".parse::<ChallengeMethod>(), Ok(ChallengeMethod::Plain));
        let err = "s256".parse::<ChallengeMethod>().unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Invalid code_challenge_method: "s256". Expected "S256" or "plain"."#
        );
    }

    #[test]
    fn test_policy() {
        assert!(PkcePolicy::AllowPlain.permits(ChallengeMethod::Plain));
        assert!(PkcePolicy::S256Only.permits(ChallengeMethod::S256));
        assert!(!PkcePolicy::S256Only.permits(ChallengeMethod::Plain));
        assert_eq!(PkcePolicy::S256Only.supported_methods(), &[ChallengeMethod::S256]);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("s256-only".parse::<PkcePolicy>().unwrap(), PkcePolicy::S256Only);
        assert_eq!("Allow-Plain".parse::<PkcePolicy>().unwrap(), PkcePolicy::AllowPlain);
        assert!("strict".parse::<PkcePolicy>().is_err());
    }
}
