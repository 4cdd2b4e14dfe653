//! HTTP transport.
//!
//! Routes requests to the OAuth handlers. Everything that must survive
//! between requests lives in [`AppState::store`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::oauth::handlers;
use crate::oauth::profiles::ProfileDirectory;
use crate::oauth::store::SessionStore;

/// Shared state for HTTP handlers.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileDirectory>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Create the HTTP router.
///
/// Methods other than those routed here get `405 Method Not Allowed`.
pub fn create_router(
    config: Config,
    store: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileDirectory>,
) -> Router {
    let state = Arc::new(AppState { config, store, profiles });

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/.well-known/openid-configuration", get(handlers::handle_discovery))
        .route(
            "/authorize",
            get(handlers::handle_authorize_get).post(handlers::handle_authorize_post),
        )
        .route("/token", post(handlers::handle_token))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sessions = match state.store.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to count sessions");
            None
        }
    };
    Json(serde_json::json!({
        "status": "ok",
        "service": "mock-idp",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": sessions
    }))
}
