//! Mock OAuth 2.0 / OpenID Connect identity provider.
//!
//! Emulates the authorization-code flow of a hosted identity provider so that
//! relying parties can be exercised end-to-end in automated tests without
//! touching real accounts.
//!
//! # Features
//!
//! - **Authorization endpoint**: login form, state validation, single-use codes
//! - **Token endpoint**: ordered validation chain with PKCE (`S256` / `plain`)
//! - **ID tokens**: scope-gated claims in compact form with a mock digest
//! - **Pluggable storage**: sessions live behind the [`SessionStore`] trait
//!
//! The third segment of every ID token is a plain SHA-256 digest, not a
//! signature. No private key exists; never treat these tokens as proof of
//! anything outside a test suite.
//!
//! # Example
//!
//! ```no_run
//! use mock_idp::{config::Config, server::IdpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = IdpServer::new(config)?;
//!     server.run_http(8000).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod oauth;
pub mod server;

pub use config::Config;
pub use error::{ConfigError, ErrorKind, OAuthError};
pub use oauth::profiles::{ProfileDirectory, StaticProfiles, UserProfile};
pub use oauth::store::{MemorySessionStore, SessionStore};
