//! ID token claims assembly.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::profiles::{ProfileDirectory, UserProfile};
use super::types::{AuthorizationSession, Scopes};
use crate::config::defaults::ID_TOKEN_LIFETIME;
use crate::error::{OAuthError, OAuthResult};

/// Claims carried in an ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub at_hash: String,
    pub sub: String,
}

/// Result of ID token assembly for a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdTokenOutcome {
    /// `openid` was not granted; the response carries no ID token.
    NotRequested,
    Issued(IdTokenClaims),
}

/// Inputs to [`build_claims`] that describe the exchange being completed.
#[derive(Debug, Clone, Copy)]
pub struct ClaimsContext<'a> {
    pub issuer: &'a str,
    pub session: &'a AuthorizationSession,
    pub scopes: &'a Scopes,
    pub access_token: &'a str,
    /// Seconds since the Unix epoch.
    pub issued_at: i64,
}

/// Assemble the claims for an ID token.
///
/// Fails closed: an unknown subject, or a profile missing a field that a
/// granted scope requires, is a configuration error rather than a token with
/// holes in it.
pub fn build_claims(
    ctx: &ClaimsContext<'_>,
    profiles: &dyn ProfileDirectory,
) -> OAuthResult<IdTokenOutcome> {
    if !ctx.scopes.contains("openid") {
        return Ok(IdTokenOutcome::NotRequested);
    }

    let subject = &ctx.session.subject;
    let Some(profile) = profiles.lookup(subject) else {
        return Err(OAuthError::configuration(format!("User not found in data: {subject}")));
    };

    let (email, email_verified) = email_claims(ctx.scopes, &profile)?;

    Ok(IdTokenOutcome::Issued(IdTokenClaims {
        email,
        email_verified,
        iss: ctx.issuer.to_string(),
        aud: ctx.session.client_id.clone(),
        iat: ctx.issued_at,
        exp: ctx.issued_at + ID_TOKEN_LIFETIME,
        at_hash: access_token_hash(ctx.access_token),
        sub: profile.sub,
    }))
}

fn email_claims(
    scopes: &Scopes,
    profile: &UserProfile,
) -> OAuthResult<(Option<String>, Option<bool>)> {
    if !scopes.contains("email") {
        return Ok((None, None));
    }
    let Some(email) = profile.email.clone() else {
        return Err(OAuthError::configuration("User email is required for email scope."));
    };
    let Some(verified) = profile.email_verified else {
        return Err(OAuthError::configuration(
            "User email_verified is required for email scope.",
        ));
    };
    Ok((Some(email), Some(verified)))
}

/// `at_hash`: left half of SHA-256 over the access token, base64url encoded.
#[must_use]
pub fn access_token_hash(access_token: &str) -> String {
    let digest = Sha256::digest(access_token.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..16])
}
