//! Authorization session storage.
//!
//! All state that crosses from the authorization endpoint to the token
//! endpoint lives behind [`SessionStore`]. [`MemorySessionStore`] keeps it in
//! a map guarded by a single `RwLock`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::AuthorizationSession;

/// Keyed store of authorization sessions.
///
/// Implementations must make [`SessionStore::take`] atomic: when two callers
/// take the same code concurrently exactly one of them receives the session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session. Fails if the code is already present.
    async fn insert(&self, session: AuthorizationSession) -> anyhow::Result<()>;

    /// Look up a session without removing it.
    async fn get(&self, code: &str) -> anyhow::Result<Option<AuthorizationSession>>;

    /// Remove a session. Returns whether one was present.
    async fn delete(&self, code: &str) -> anyhow::Result<bool>;

    /// Look up and remove a session in one step.
    async fn take(&self, code: &str) -> anyhow::Result<Option<AuthorizationSession>>;

    /// Number of outstanding sessions.
    async fn count(&self) -> anyhow::Result<usize>;
}

/// In-memory session store.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, AuthorizationSession>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: AuthorizationSession) -> anyhow::Result<()> {
        match self.sessions.write().await.entry(session.code.clone()) {
            Entry::Occupied(_) => anyhow::bail!("authorization code already exists"),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            }
        }
    }

    async fn get(&self, code: &str) -> anyhow::Result<Option<AuthorizationSession>> {
        Ok(self.sessions.read().await.get(code).cloned())
    }

    async fn delete(&self, code: &str) -> anyhow::Result<bool> {
        Ok(self.sessions.write().await.remove(code).is_some())
    }

    async fn take(&self, code: &str) -> anyhow::Result<Option<AuthorizationSession>> {
        Ok(self.sessions.write().await.remove(code))
    }

    async fn count(&self) -> anyhow::Result<usize> {
        Ok(self.sessions.read().await.len())
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore").finish()
    }
}

/// Generate an unguessable token from two UUIDs (244 random bits).
#[must_use]
pub fn generate_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}
