//! HTTP endpoint handlers.
//!
//! Implements:
//! - OpenID Connect Discovery 1.0: provider metadata
//! - RFC 6749 §4.1: Authorization Code Grant
//! - RFC 7636: PKCE (S256 and plain)

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use super::authorize::{self, AuthorizeParams};
use super::login::render_login_page;
use super::token::{TokenEndpoint, TokenForm};
use super::types::TokenResponse;
use crate::error::{ErrorKind, OAuthError};
use crate::server::transport::AppState;

// ─── OpenID Connect Discovery ────────────────────────────────────────────────

/// `GET /.well-known/openid-configuration`
pub async fn handle_discovery(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = &state.config;
    let methods: Vec<&str> =
        config.pkce_policy.supported_methods().iter().map(|m| m.as_str()).collect();

    Json(serde_json::json!({
        "issuer": config.issuer,
        "authorization_endpoint": config.endpoint("/authorize"),
        "token_endpoint": config.endpoint("/token"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "subject_types_supported": ["public"],
        "scopes_supported": ["openid", "email"],
        "claims_supported": ["iss", "aud", "iat", "exp", "at_hash", "sub", "email", "email_verified"],
        "id_token_signing_alg_values_supported": [super::jwt::ALG],
        "token_endpoint_auth_methods_supported": ["client_secret_basic"],
        "code_challenge_methods_supported": methods
    }))
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

/// `GET /authorize`
///
/// Validate the request and render the login form.
pub async fn handle_authorize_get(
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let pairs = match query {
        Ok(Query(pairs)) => pairs,
        Err(rejection) => return reject("authorize", OAuthError::malformed(rejection.body_text())),
    };
    let params = AuthorizeParams::from_pairs(&pairs);
    if let Err(err) = params.validate() {
        return reject("authorize", err);
    }
    Html(render_login_page(&pairs)).into_response()
}

/// `POST /authorize`
///
/// Accept the login form and redirect back to the client with a code.
pub async fn handle_authorize_post(
    State(state): State<Arc<AppState>>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let pairs = match form {
        Ok(Form(pairs)) => pairs,
        Err(rejection) => return reject("authorize", OAuthError::malformed(rejection.body_text())),
    };
    let params = AuthorizeParams::from_pairs(&pairs);
    match authorize::authorize(state.store.as_ref(), &params).await {
        Ok(location) => (StatusCode::SEE_OTHER, [(header::LOCATION, location.to_string())])
            .into_response(),
        Err(err) => reject("authorize", err),
    }
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

/// `POST /token`
///
/// Exchange an authorization code for an access token and, when `openid`
/// was granted, an ID token.
pub async fn handle_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(pairs)) => TokenForm::from_pairs(&pairs),
        Err(rejection) => return reject("token", OAuthError::malformed(rejection.body_text())),
    };

    let authorization = headers
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());

    let endpoint = TokenEndpoint {
        config: &state.config,
        store: state.store.as_ref(),
        profiles: state.profiles.as_ref(),
    };

    match endpoint.exchange(&form, authorization).await {
        Ok(response) => token_success(&response),
        Err(err) => err.into_response(),
    }
}

/// Build a token response with required OAuth 2.0 cache headers (RFC 6749 §5.1).
fn token_success(body: &TokenResponse) -> Response {
    let mut response = Json(body).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

fn reject(endpoint: &'static str, err: OAuthError) -> Response {
    match err.kind() {
        ErrorKind::Configuration | ErrorKind::Internal => {
            tracing::error!(endpoint, error = ?err, "Request failed inside the provider");
        }
        kind => tracing::warn!(endpoint, kind = ?kind, error = %err, "Rejected request"),
    }
    err.into_response()
}
