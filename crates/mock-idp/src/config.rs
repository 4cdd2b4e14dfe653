//! Configuration for the mock identity provider.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::oauth::pkce::PkcePolicy;

/// Protocol constants of the emulated provider.
pub mod defaults {
    /// Issuer placed in the `iss` claim.
    pub const ISSUER: &str = "https://accounts.google.com";

    /// Base URL this server announces in its discovery document.
    pub const PUBLIC_URL: &str = "http://localhost:8000";

    /// The only client secret the token endpoint accepts.
    pub const CLIENT_SECRET: &str = "mock_client_secret";

    /// `expires_in` reported for access tokens, in seconds.
    pub const ACCESS_TOKEN_EXPIRES_IN: u64 = 3599;

    /// Lifetime of an ID token (`exp - iat`), in seconds.
    pub const ID_TOKEN_LIFETIME: i64 = 3600;

    /// Exact length required of the `state` parameter.
    pub const STATE_LENGTH: usize = 43;
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Value of the `iss` claim.
    pub issuer: String,

    /// Base URL used for endpoint announcements.
    pub public_url: String,

    /// Expected client secret for HTTP Basic client authentication.
    pub client_secret: String,

    /// Which PKCE challenge methods are honoured at redemption.
    pub pkce_policy: PkcePolicy,

    /// JSON file holding the user profile fixtures (optional).
    pub profiles_path: Option<PathBuf>,
}

impl Config {
    /// Create a configuration with the emulated provider's defaults.
    #[must_use]
    pub fn new(pkce_policy: PkcePolicy, profiles_path: Option<PathBuf>) -> Self {
        Self {
            issuer: defaults::ISSUER.to_string(),
            public_url: defaults::PUBLIC_URL.to_string(),
            client_secret: defaults::CLIENT_SECRET.to_string(),
            pkce_policy,
            profiles_path,
        }
    }

    /// Create a test configuration announcing the given base URL.
    #[must_use]
    pub fn for_testing(public_url: &str) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `MOCK_IDP_ISSUER`, `MOCK_IDP_PUBLIC_URL`, `MOCK_IDP_CLIENT_SECRET`,
    /// `MOCK_IDP_PKCE_POLICY` and `MOCK_IDP_PROFILES`; unset variables keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the PKCE policy is not recognised.
    pub fn from_env() -> Result<Self, ConfigError> {
        let pkce_policy = match std::env::var("MOCK_IDP_PKCE_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => PkcePolicy::default(),
        };
        let profiles_path = std::env::var_os("MOCK_IDP_PROFILES").map(PathBuf::from);

        let mut config = Self::new(pkce_policy, profiles_path);
        if let Ok(issuer) = std::env::var("MOCK_IDP_ISSUER") {
            config.issuer = issuer;
        }
        if let Ok(public_url) = std::env::var("MOCK_IDP_PUBLIC_URL") {
            config.public_url = public_url.trim_end_matches('/').to_string();
        }
        if let Ok(secret) = std::env::var("MOCK_IDP_CLIENT_SECRET") {
            config.client_secret = secret;
        }
        Ok(config)
    }

    /// Endpoint URL under the announced base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PkcePolicy::default(), None)
    }
}
