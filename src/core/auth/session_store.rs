use super::auth_models::SessionData;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session backend error: {0}")]
    Backend(String),
}

/// Persistence port for browser sessions.
///
/// The web layer only ever hands us an opaque session id from the (signed)
/// session cookie; what sits behind it lives here. One client per session is
/// assumed, so there is no conflict resolution between concurrent writers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns `None` for ids we have never seen (or have forgotten).
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, StoreError>;

    /// Replaces whatever was stored under `session_id`.
    async fn put(&self, session_id: &str, data: SessionData) -> Result<(), StoreError>;
}

#[async_trait]
impl SessionStore for Box<dyn SessionStore> {
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, StoreError> {
        (**self).get(session_id).await
    }

    async fn put(&self, session_id: &str, data: SessionData) -> Result<(), StoreError> {
        (**self).put(session_id, data).await
    }
}
