//! StartSurveyHandler - Command handler for opening a survey session.

use std::sync::Arc;

use tracing::info;

use super::orchestrator::SurveyOrchestrator;
use crate::domain::session::{AccessToken, SessionContext, SessionError, SurveySession};
use crate::domain::survey::FormReference;
use crate::ports::{FormSource, SessionRepository};

/// Command to start filling out a form.
#[derive(Debug, Clone)]
pub struct StartSurveyCommand {
    pub form_link: String,
    /// The caller agreed to let the assistant read the form.
    pub consent: bool,
    pub access_token: AccessToken,
}

/// Handler for starting sessions.
pub struct StartSurveyHandler {
    form_source: Arc<dyn FormSource>,
    repository: Arc<dyn SessionRepository>,
    orchestrator: Arc<SurveyOrchestrator>,
}

impl StartSurveyHandler {
    pub fn new(
        form_source: Arc<dyn FormSource>,
        repository: Arc<dyn SessionRepository>,
        orchestrator: Arc<SurveyOrchestrator>,
    ) -> Self {
        Self {
            form_source,
            repository,
            orchestrator,
        }
    }

    /// Validates the request, loads the form and asks the first questions.
    ///
    /// A form that cannot be loaded still yields a stored session, in the
    /// `Failed(SchemaUnavailable)` state with its notice in the transcript.
    pub async fn handle(&self, cmd: StartSurveyCommand) -> Result<SurveySession, SessionError> {
        // 1. Preconditions
        if !cmd.consent {
            return Err(SessionError::validation(
                "consent",
                "Consent to read the form is required",
            ));
        }
        if cmd.access_token.is_blank() {
            return Err(SessionError::unauthorized());
        }
        let form = FormReference::parse(&cmd.form_link)?;

        // 2. Register the session
        let session = SurveySession::new(SessionContext::new(form.clone(), cmd.access_token.clone()));
        let session_id = session.id();
        let shared = self.repository.insert(session).await?;
        info!(session_id = %session_id, form = %form, "Survey session started");

        // 3. Load the form and run the first round
        let mut session = shared.lock().await;
        match self.form_source.load_schema(&form, &cmd.access_token).await {
            Ok(schema) => self.orchestrator.begin(&mut session, schema).await?,
            Err(err) => {
                self.orchestrator
                    .abort_start(&mut session, &err.to_string())
                    .await?
            }
        }

        Ok(session.clone())
    }
}
