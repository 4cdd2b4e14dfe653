//! Compact token serialization.
//!
//! Produces `header.claims.digest`, each segment base64url without padding.
//! The digest is SHA-256 over `header.claims`. There is no private key: the
//! third segment is a deterministic placeholder that anyone can recompute, so
//! it proves nothing about who minted the token.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Algorithm named in the header. Kept for shape compatibility only.
pub const ALG: &str = "RS256";

/// Token type named in the header.
pub const TYP: &str = "JWT";

/// Fixed token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    pub typ: String,
}

impl Default for Header {
    fn default() -> Self {
        Self { alg: ALG.to_string(), typ: TYP.to_string() }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("token must have three segments")]
    Malformed,

    #[error("invalid base64url segment: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid JSON segment: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize claims into the compact three-segment form.
pub fn encode<T: Serialize>(claims: &T) -> Result<String, CodecError> {
    let header = encode_segment(&Header::default())?;
    let payload = encode_segment(claims)?;
    let signing_input = format!("{header}.{payload}");
    let digest = digest(&signing_input);
    Ok(format!("{signing_input}.{digest}"))
}

/// Mock digest over `header.claims`.
#[must_use]
pub fn digest(signing_input: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(signing_input.as_bytes()))
}

/// A compact token split back into its parts.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub header: Header,
    pub claims: T,
    /// Whether the third segment equals the recomputed digest.
    pub digest_matches: bool,
}

/// Split and decode a compact token.
pub fn decode<T: DeserializeOwned>(token: &str) -> Result<Decoded<T>, CodecError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(tail), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CodecError::Malformed);
    };

    let digest_matches = digest(&format!("{header}.{payload}")) == tail;

    Ok(Decoded {
        header: decode_segment(header)?,
        claims: decode_segment(payload)?,
        digest_matches,
    })
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, CodecError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_three_segments_without_padding() {
        let token = encode(&json!({"sub": "1001"})).unwrap();
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }

    #[test]
    fn test_header_segment() {
        let token = encode(&json!({})).unwrap();
        let header = token.split('.').next().unwrap();
        let bytes = URL_SAFE_NO_PAD.decode(header).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"alg": "RS256", "typ": "JWT"}));
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = encode(&json!({"sub": "1001", "iat": 1})).unwrap();
        let b = encode(&json!({"sub": "1001", "iat": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode() {
        let token = encode(&json!({"sub": "1001"})).unwrap();
        let decoded: Decoded<serde_json::Value> = decode(&token).unwrap();
        assert_eq!(decoded.header, Header::default());
        assert_eq!(decoded.claims["sub"], "1001");
        assert!(decoded.digest_matches);
    }

    #[test]
    fn test_decode_detects_tampered_claims() {
        let token = encode(&json!({"sub": "1001"})).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        parts[1] = URL_SAFE_NO_PAD.encode(br#"{"sub":"1002"}"#);
        let decoded: Decoded<serde_json::Value> = decode(&parts.join(".")).unwrap();
        assert!(!decoded.digest_matches);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode::<serde_json::Value>("a.b"),
            Err(CodecError::Malformed)
        ));
        assert!(matches!(
            decode::<serde_json::Value>("a.b.c.d"),
            Err(CodecError::Malformed)
        ));
    }
}
