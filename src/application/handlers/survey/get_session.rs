//! GetSessionHandler - Query handler for a session snapshot.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::session::{SessionError, SurveySession};
use crate::ports::SessionRepository;

/// Query to get a session by ID.
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
}

/// Handler for retrieving session snapshots.
pub struct GetSessionHandler {
    repository: Arc<dyn SessionRepository>,
}

impl GetSessionHandler {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Returns a copy of the session. Waits if a step is in progress.
    pub async fn handle(&self, query: GetSessionQuery) -> Result<SurveySession, SessionError> {
        let shared = self
            .repository
            .find(&query.session_id)
            .await?
            .ok_or_else(|| SessionError::not_found(query.session_id))?;

        let session = shared.lock().await;
        Ok(session.clone())
    }
}
