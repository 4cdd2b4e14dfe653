//! Mock OAuth 2.0 / OpenID Connect authorization server.
//!
//! Emulates the authorization-code flow of a hosted identity provider for
//! automated tests.
//!
//! ## Supported Standards
//! - RFC 6749: Authorization Code Grant
//! - RFC 7617: HTTP Basic client authentication
//! - RFC 7636: PKCE (S256 and plain)
//! - OpenID Connect Core 1.0: ID tokens (unsigned, see [`jwt`])
//! - OpenID Connect Discovery 1.0

pub mod authorize;
pub mod claims;
pub mod handlers;
pub mod jwt;
pub mod login;
pub mod pkce;
pub mod profiles;
pub mod store;
pub mod token;
pub mod types;

pub use store::{MemorySessionStore, SessionStore};
pub use token::TokenEndpoint;
pub use types::{AuthorizationSession, TokenResponse};
