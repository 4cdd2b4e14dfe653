//! Mock identity provider server.

pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ConfigError;
use crate::oauth::profiles::{ProfileDirectory, StaticProfiles};
use crate::oauth::store::{MemorySessionStore, SessionStore};

/// Mock identity provider bound to its configuration and collaborators.
pub struct IdpServer {
    config: Config,
    store: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl IdpServer {
    /// Create a server with an in-memory session store, loading profiles from
    /// `config.profiles_path` when set.
    ///
    /// # Errors
    ///
    /// Returns error if the profile fixture cannot be read or parsed.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let profiles = match &config.profiles_path {
            Some(path) => StaticProfiles::from_path(path)?,
            None => StaticProfiles::new(),
        };
        tracing::info!(count = profiles.len(), "Loaded user profiles");

        Ok(Self::with_parts(config, Arc::new(MemorySessionStore::new()), Arc::new(profiles)))
    }

    /// Create a server from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        config: Config,
        store: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self { config, store, profiles }
    }

    /// Build the router without binding a socket.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        transport::create_router(
            self.config.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.profiles),
        )
    }

    /// Run the server in HTTP mode.
    ///
    /// # Errors
    ///
    /// Returns error on server failure.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        tracing::info!(
            issuer = %self.config.issuer,
            pkce_policy = ?self.config.pkce_policy,
            "Starting mock identity provider on port {}",
            port
        );

        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!("HTTP server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

impl std::fmt::Debug for IdpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdpServer").field("config", &self.config).finish_non_exhaustive()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
