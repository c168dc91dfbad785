//! Session registry — one conversation session per platform user.
//!
//! Sessions live in memory for the life of the process, keyed by user id.
//! The registry is bounded: idle sessions are swept periodically and, at
//! capacity, the least recently seen session is evicted before a new one is
//! inserted. Lookup and creation happen under a single write lock, so two
//! concurrent first contacts from the same user resolve to one session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SessionConfig;

/// Session identifier. UUIDv7, so ids sort by creation time.
pub type SessionId = Uuid;

/// A per-user conversation record.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: String,
    /// Free-form conversation context. Not read by the router.
    pub context: serde_json::Map<String, serde_json::Value>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn new(user_id: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            context: serde_json::Map::new(),
            last_seen: Utc::now(),
        }
    }
}

/// In-memory session store keyed by user id.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        })
    }

    /// Return the user's session id, creating the session on first contact.
    pub async fn find_or_create(&self, user_id: &str) -> SessionId {
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.get_mut(user_id) {
            session.last_seen = Utc::now();
            return session.id;
        }

        if sessions.len() >= self.config.max_sessions {
            evict_least_recent(&mut sessions);
        }

        let session = Session::new(user_id);
        let id = session.id;
        debug!(session_id = %id, user = %user_id, "Session created");
        sessions.insert(user_id.to_string(), session);
        id
    }

    /// Look up a session by id.
    pub async fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions
            .read()
            .await
            .values()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Look up a session by user id.
    pub async fn get_by_user(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle longer than the configured timeout. Returns how many.
    pub async fn expire_idle(&self) -> usize {
        let Ok(idle) = chrono::Duration::from_std(self.config.idle_timeout) else {
            return 0;
        };
        let cutoff = Utc::now() - idle;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.last_seen > cutoff);
        let expired = before - sessions.len();

        if expired > 0 {
            info!(expired, remaining = sessions.len(), "Expired idle sessions");
        }
        expired
    }
}

fn evict_least_recent(sessions: &mut HashMap<String, Session>) {
    let oldest = sessions
        .iter()
        .min_by_key(|(_, s)| s.last_seen)
        .map(|(user, _)| user.clone());

    if let Some(user) = oldest {
        sessions.remove(&user);
        debug!(user = %user, "Session evicted at capacity");
    }
}

/// Spawn a background task that sweeps idle sessions on an interval.
pub fn spawn_expiry_task(
    registry: Arc<SessionRegistry>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            registry.expire_idle().await;
        }
    })
}
