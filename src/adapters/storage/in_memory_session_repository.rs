//! In-Memory Session Repository Adapter
//!
//! Keeps live sessions in a map keyed by session id. Each session sits
//! behind its own `tokio::sync::Mutex`, so steps of one session run one at
//! a time while different sessions proceed independently.
//!
//! Finished sessions (completed or failed) stay readable for a retention
//! period so their results can be fetched, then are swept on the next
//! insert. When the store is full, the oldest finished sessions make room
//! before a new session is refused.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::SurveySession;
use crate::ports::{RepositoryError, SessionRepository, SharedSession};

/// In-memory storage for survey sessions
#[derive(Debug, Clone)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, SharedSession>>>,
    max_sessions: Option<usize>,
    retention: Option<Duration>,
}

impl InMemorySessionRepository {
    /// Create an unbounded repository
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions: None,
            retention: None,
        }
    }

    /// Create a repository that refuses sessions beyond `max_sessions`
    pub fn with_capacity(max_sessions: usize) -> Self {
        Self {
            max_sessions: Some(max_sessions),
            ..Self::new()
        }
    }

    /// Drop finished sessions once they are older than `retention`
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = Some(retention);
        self
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

/// Last update of a finished session. Sessions locked by a running step
/// are in use and never reported.
fn finished_at(session: &SharedSession) -> Option<Timestamp> {
    let guard = session.try_lock().ok()?;
    guard.is_terminal().then(|| guard.updated_at())
}

fn older_than(ts: Timestamp, retention: Duration) -> bool {
    Utc::now()
        .signed_duration_since(*ts.as_datetime())
        .to_std()
        .map_or(false, |age| age >= retention)
}

/// Removes finished sessions past retention, then, while at capacity, the
/// oldest remaining finished sessions.
fn evict(
    sessions: &mut HashMap<SessionId, SharedSession>,
    max_sessions: Option<usize>,
    retention: Option<Duration>,
) {
    let mut finished: Vec<(Timestamp, SessionId)> = sessions
        .iter()
        .filter_map(|(id, s)| finished_at(s).map(|ts| (ts, *id)))
        .collect();
    if finished.is_empty() {
        return;
    }
    finished.sort_by_key(|(ts, _)| *ts);

    let mut evicted = 0usize;
    for (ts, id) in finished {
        let expired = retention.map_or(false, |r| older_than(ts, r));
        let full = max_sessions.map_or(false, |max| sessions.len() >= max);
        if !(expired || full) {
            continue;
        }
        sessions.remove(&id);
        evicted += 1;
    }
    if evicted > 0 {
        debug!(evicted, remaining = sessions.len(), "Evicted finished sessions");
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: SurveySession) -> Result<SharedSession, RepositoryError> {
        let id = session.id();
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&id) {
            return Err(RepositoryError::AlreadyExists(id));
        }
        evict(&mut sessions, self.max_sessions, self.retention);
        if let Some(max) = self.max_sessions {
            if sessions.len() >= max {
                return Err(RepositoryError::CapacityExceeded(max));
            }
        }

        let shared = Arc::new(Mutex::new(session));
        sessions.insert(id, shared.clone());
        Ok(shared)
    }

    async fn find(&self, id: &SessionId) -> Result<Option<SharedSession>, RepositoryError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, RepositoryError> {
        Ok(self.sessions.write().await.remove(id).is_some())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.sessions.read().await.len())
    }
}
