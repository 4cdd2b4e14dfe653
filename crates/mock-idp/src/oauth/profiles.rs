//! User profile fixtures.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Reference data about an end-user, supplied by the test fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

impl UserProfile {
    #[must_use]
    pub fn new(sub: impl Into<String>) -> Self {
        Self { sub: sub.into(), email: None, email_verified: None }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = Some(email.into());
        self.email_verified = Some(verified);
        self
    }
}

/// Read-only lookup of profiles by subject identifier.
pub trait ProfileDirectory: Send + Sync {
    fn lookup(&self, subject: &str) -> Option<UserProfile>;
}

/// Profiles held in memory, usually loaded from a JSON fixture of the form
/// `{"<subject>": {"sub": "...", "email": "...", "email_verified": true}}`.
#[derive(Debug, Clone, Default)]
pub struct StaticProfiles {
    profiles: HashMap<String, UserProfile>,
}

impl StaticProfiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile under `subject`.
    #[must_use]
    pub fn with_profile(mut self, subject: impl Into<String>, profile: UserProfile) -> Self {
        self.profiles.insert(subject.into(), profile);
        self
    }

    /// Parse a JSON fixture.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let profiles = serde_json::from_str(json)?;
        Ok(Self { profiles })
    }

    /// Read and parse a JSON fixture file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::ProfilesRead { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl ProfileDirectory for StaticProfiles {
    fn lookup(&self, subject: &str) -> Option<UserProfile> {
        self.profiles.get(subject).cloned()
    }
}
