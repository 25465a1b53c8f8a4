// In-memory implementation of SessionStore.
//
// Sessions live only as long as the process. The browser only ever holds the
// signed session id; credentials never leave the server.

use crate::core::auth::{SessionData, SessionStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Sessions not written for this long are forgotten.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Upper bound on live sessions; the oldest write is dropped past it.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct StoredSession {
    data: SessionData,
    written_at: Instant,
    // Insertion order; Instants can tie.
    seq: u64,
}

impl StoredSession {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.written_at.elapsed() >= ttl
    }
}

/// Session id -> session contents.
///
/// DashMap lets concurrent requests for different sessions proceed without a
/// global lock. Every cookieless visit to `/authorize` creates an entry, so
/// entries expire after `ttl` and the map never grows past `max_sessions`.
pub struct InMemorySessionStore {
    sessions: DashMap<String, StoredSession>,
    next_seq: AtomicU64,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            next_seq: AtomicU64::new(0),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Makes room for one new entry: expired sessions go first, then the
    /// oldest writes.
    fn evict_for_insert(&self) {
        let ttl = self.ttl;
        self.sessions.retain(|_, stored| !stored.is_expired(ttl));

        while self.sessions.len() >= self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().seq)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.sessions.remove(&key);
                }
                None => break,
            }
        }

        tracing::debug!(live = self.sessions.len(), "Evicted sessions to stay under the cap");
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, StoreError> {
        let found = self
            .sessions
            .get(session_id)
            .map(|stored| (stored.data.clone(), stored.is_expired(self.ttl)));

        match found {
            Some((_, true)) => {
                let ttl = self.ttl;
                self.sessions
                    .remove_if(session_id, |_, stored| stored.is_expired(ttl));
                Ok(None)
            }
            Some((data, false)) => Ok(Some(data)),
            None => Ok(None),
        }
    }

    async fn put(&self, session_id: &str, data: SessionData) -> Result<(), StoreError> {
        if !self.sessions.contains_key(session_id) && self.sessions.len() >= self.max_sessions {
            self.evict_for_insert();
        }

        let stored = StoredSession {
            data,
            written_at: Instant::now(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        self.sessions.insert(session_id.to_string(), stored);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(state: &str) -> SessionData {
        SessionData {
            state: Some(state.to_string()),
            credentials: None,
        }
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        let store = InMemorySessionStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_previous_contents() {
        let store = InMemorySessionStore::new();

        store.put("s1", pending("abc")).await.unwrap();
        store.put("s1", SessionData::default()).await.unwrap();

        let stored = store.get("s1").await.unwrap().unwrap();
        assert_eq!(stored, SessionData::default());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        store.put("a", pending("for-a")).await.unwrap();

        assert!(store.get("b").await.unwrap().is_none());
        assert_eq!(
            store.get("a").await.unwrap().unwrap().state.as_deref(),
            Some("for-a")
        );
    }

    #[tokio::test]
    async fn test_expired_session_is_forgotten() {
        let store = InMemorySessionStore::with_limits(Duration::ZERO, 10);
        store.put("a", pending("for-a")).await.unwrap();

        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_logins_do_not_grow_past_the_cap() {
        let store = InMemorySessionStore::with_limits(DEFAULT_SESSION_TTL, 2);

        for id in ["a", "b", "c", "d"] {
            store.put(id, pending(id)).await.unwrap();
        }

        assert_eq!(store.len(), 2);
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
        assert!(store.get("d").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rewriting_a_live_session_at_the_cap_evicts_nothing() {
        let store = InMemorySessionStore::with_limits(DEFAULT_SESSION_TTL, 2);
        store.put("a", pending("a")).await.unwrap();
        store.put("b", pending("b")).await.unwrap();

        store.put("a", SessionData::default()).await.unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.get("b").await.unwrap().is_some());
    }
}
