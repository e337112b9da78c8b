//! Session repository port.
//!
//! Sessions are ephemeral and live in memory. Each stored session sits
//! behind its own async mutex: holding the lock serializes the steps of one
//! session while other sessions proceed independently.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::foundation::SessionId;
use crate::domain::session::{SessionError, SurveySession};

/// A stored session, locked per step.
pub type SharedSession = Arc<Mutex<SurveySession>>;

/// Errors from the session store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("session already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("session store is full ({0} sessions)")]
    CapacityExceeded(usize),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Repository port for live survey sessions.
impl From<RepositoryError> for SessionError {
    fn from(err: RepositoryError) -> Self {
        SessionError::infrastructure(err.to_string())
    }
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a new session and returns its shared handle.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    async fn insert(&self, session: SurveySession) -> Result<SharedSession, RepositoryError>;

    /// Finds a session by id. Returns `None` if not found.
    async fn find(&self, id: &SessionId) -> Result<Option<SharedSession>, RepositoryError>;

    /// Removes a session. Returns true if it existed.
    async fn remove(&self, id: &SessionId) -> Result<bool, RepositoryError>;

    /// Number of stored sessions.
    async fn count(&self) -> Result<usize, RepositoryError>;
}
