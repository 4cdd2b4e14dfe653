//! OAuth 2.0 types shared by the endpoints.

use serde::{Deserialize, Serialize};

use super::pkce::ChallengeMethod;

/// PKCE challenge recorded at authorization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChallenge {
    pub challenge: String,
    pub method: Option<ChallengeMethod>,
}

impl CodeChallenge {
    /// The method to verify with; `plain` when none was supplied.
    #[must_use]
    pub fn effective_method(&self) -> ChallengeMethod {
        self.method.unwrap_or(ChallengeMethod::Plain)
    }
}

/// An authorization code together with everything it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSession {
    pub code: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Option<String>,
    /// Key into the profile directory.
    pub subject: String,
    pub code_challenge: Option<CodeChallenge>,
}

/// Granted scope names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scopes(Vec<String>);

impl Scopes {
    /// Split a space-delimited scope string.
    #[must_use]
    pub fn parse(scope: &str) -> Self {
        Self(scope.split(' ').filter(|s| !s.is_empty()).map(str::to_owned).collect())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|s| s == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Successful token endpoint response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    pub scope: String,
    pub token_type: String,
    pub expires_in: u64,
}
