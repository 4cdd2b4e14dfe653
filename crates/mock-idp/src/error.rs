//! Error types for the mock identity provider.
//!
//! Uses `thiserror` for structured error handling. Every [`OAuthError`]
//! renders as the exact plain-text body returned to the client.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::oauth::pkce::ChallengeMethod;

/// Broad classification of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid parameter. Nothing was changed.
    MalformedRequest,
    /// PKCE, redirect or client credential mismatch.
    ProtocolViolation,
    /// Unknown or already redeemed code.
    NotFound,
    /// The fixture or deployment is set up wrong, not the caller.
    Configuration,
    /// Storage or encoding failure inside the provider.
    Internal,
}

/// Errors returned by the authorization and token endpoints.
#[derive(thiserror::Error, Debug)]
pub enum OAuthError {
    /// Missing or malformed request parameter
    #[error("{0}")]
    MalformedRequest(String),

    /// Request is well-formed but does not match the stored session
    #[error("{0}")]
    ProtocolViolation(String),

    /// No session for the presented code
    #[error("Auth session not found for code: \"{code}\".")]
    SessionNotFound {
        /// The code that was presented
        code: String,
    },

    /// Stored challenge method is disallowed by the PKCE policy
    #[error("Unsupported code_challenge_method: \"{method}\". Expected \"S256\".")]
    UnsupportedChallengeMethod {
        /// The method recorded on the session
        method: ChallengeMethod,
    },

    /// Profile fixture lacks data the granted scopes require
    #[error("{0}")]
    Configuration(String),

    /// Session store failure
    #[error("Failed to {action}.")]
    Storage {
        /// What the provider was trying to do
        action: &'static str,
        /// Underlying store error
        #[source]
        source: anyhow::Error,
    },

    /// Token encoding failure
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

impl OAuthError {
    /// Create a malformed request error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest(message.into())
    }

    /// Create a malformed request error for an absent parameter.
    #[must_use]
    pub fn missing_parameter(name: &str) -> Self {
        Self::MalformedRequest(format!("Parameter {name} is required."))
    }

    /// Create a malformed request error for a parameter with the wrong value.
    #[must_use]
    pub fn unexpected_value(name: &str, actual: &str, expected: &str) -> Self {
        Self::MalformedRequest(format!(
            "Invalid {name}: \"{actual}\". Expected \"{expected}\"."
        ))
    }

    /// Create a protocol violation error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation(message.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(action: &'static str, source: anyhow::Error) -> Self {
        Self::Storage { action, source }
    }

    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRequest(_) => ErrorKind::MalformedRequest,
            Self::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            Self::SessionNotFound { .. } => ErrorKind::NotFound,
            Self::UnsupportedChallengeMethod { .. } | Self::Configuration(_) => {
                ErrorKind::Configuration
            }
            Self::Storage { .. } | Self::Encoding(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status returned to the client.
    ///
    /// A policy-rejected challenge method is reported as a client error even
    /// though it is logged as a configuration defect.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_)
            | Self::ProtocolViolation(_)
            | Self::SessionNotFound { .. }
            | Self::UnsupportedChallengeMethod { .. } => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Storage { .. } | Self::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns true if the error points at the fixture rather than the caller.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration)
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Errors raised while building a [`crate::Config`] or loading fixtures.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Unrecognised PKCE policy name
    #[error("Invalid PKCE policy: \"{0}\". Expected \"allow-plain\" or \"s256-only\".")]
    InvalidPkcePolicy(String),

    /// Profile fixture file could not be read
    #[error("Failed to read profiles from {path}: {source}")]
    ProfilesRead {
        /// Fixture path
        path: PathBuf,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// Profile fixture file is not valid JSON
    #[error("Failed to parse profiles: {0}")]
    ProfilesParse(#[from] serde_json::Error),
}

/// Result type alias for endpoint operations.
pub type OAuthResult<T> = Result<T, OAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        let err = OAuthError::missing_parameter("client_id");
        assert_eq!(err.to_string(), "Parameter client_id is required.");
        assert_eq!(err.kind(), ErrorKind::MalformedRequest);
    }

    #[test]
    fn test_unexpected_value_message() {
        let err = OAuthError::unexpected_value("response_type", "token", "code");
        assert_eq!(err.to_string(), r#"Invalid response_type: "token". Expected "code"."#);
    }

    #[test]
    fn test_unsupported_method_is_configuration_but_client_status() {
        let err = OAuthError::UnsupportedChallengeMethod { method: ChallengeMethod::Plain };
        assert!(err.is_configuration());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("\"plain\""));
    }

    #[test]
    fn test_profile_defect_is_server_error() {
        let err = OAuthError::configuration("User email is required for email scope.");
        assert!(err.is_configuration());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_error_message() {
        let err = OAuthError::storage("store login session", anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "Failed to store login session.");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
