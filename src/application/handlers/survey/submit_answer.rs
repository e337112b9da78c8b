//! SubmitAnswerHandler - Command handler for one user answer.

use std::sync::Arc;

use tracing::{debug, warn};

use super::orchestrator::SurveyOrchestrator;
use crate::domain::foundation::SessionId;
use crate::domain::session::{AnswerOutcome, AnswerRejection, SessionError, SurveySession};
use crate::ports::SessionRepository;

/// Command carrying the answer to one question of the current batch.
#[derive(Debug, Clone)]
pub struct SubmitAnswerCommand {
    pub session_id: SessionId,
    /// Index of the question being answered, as shown to the user.
    pub turn_index: usize,
    pub answer: String,
}

/// Result of a submission. Rejections leave the session untouched.
#[derive(Debug, Clone)]
pub struct SubmitAnswerResult {
    pub outcome: AnswerOutcome,
    pub session: SurveySession,
}

/// Handler for answer submission.
pub struct SubmitAnswerHandler {
    repository: Arc<dyn SessionRepository>,
    orchestrator: Arc<SurveyOrchestrator>,
}

impl SubmitAnswerHandler {
    pub fn new(repository: Arc<dyn SessionRepository>, orchestrator: Arc<SurveyOrchestrator>) -> Self {
        Self {
            repository,
            orchestrator,
        }
    }

    /// Records the answer. When it completes the batch, reconciliation (and
    /// any following generation round) runs before this returns.
    pub async fn handle(&self, cmd: SubmitAnswerCommand) -> Result<SubmitAnswerResult, SessionError> {
        let shared = self
            .repository
            .find(&cmd.session_id)
            .await?
            .ok_or_else(|| SessionError::not_found(cmd.session_id))?;

        let mut session = shared.lock().await;
        let outcome = session.submit_answer(cmd.turn_index, &cmd.answer);

        match outcome {
            AnswerOutcome::Rejected(AnswerRejection::Stale { submitted, awaiting }) => {
                warn!(
                    session_id = %cmd.session_id,
                    submitted,
                    awaiting = ?awaiting,
                    state = ?session.state(),
                    "Dropping stale answer"
                );
            }
            AnswerOutcome::Rejected(AnswerRejection::EmptyAnswer) => {
                debug!(session_id = %cmd.session_id, turn_index = cmd.turn_index, "Empty answer, re-prompting");
            }
            AnswerOutcome::NextQuestion(_) => {
                self.orchestrator.flush(&mut session).await;
            }
            AnswerOutcome::BatchComplete => {
                self.orchestrator.drive(&mut session).await?;
            }
        }

        Ok(SubmitAnswerResult {
            outcome,
            session: session.clone(),
        })
    }
}
