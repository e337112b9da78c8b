//! ExportResultsHandler - Query handler for a completed session's answers.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::session::SessionError;
use crate::domain::survey::AnswerSet;
use crate::ports::SessionRepository;

/// Query for the final answer set.
#[derive(Debug, Clone)]
pub struct ExportResultsQuery {
    pub session_id: SessionId,
}

/// Handler returning the ordered question/answer pairs.
pub struct ExportResultsHandler {
    repository: Arc<dyn SessionRepository>,
}

impl ExportResultsHandler {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: ExportResultsQuery) -> Result<AnswerSet, SessionError> {
        let shared = self
            .repository
            .find(&query.session_id)
            .await?
            .ok_or_else(|| SessionError::not_found(query.session_id))?;

        let session = shared.lock().await;
        session
            .answer_set()
            .cloned()
            .ok_or_else(|| SessionError::not_completed(query.session_id))
    }
}
