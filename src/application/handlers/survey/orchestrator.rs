//! SurveyOrchestrator - drives a session through generation and
//! reconciliation until it completes or fails.
//!
//! The orchestrator owns no session state. Callers hand it a `&mut
//! SurveySession` (normally while holding that session's lock) and it runs
//! every model-bound step that is due, publishing transcript changes to the
//! sink as they happen. It returns once the session is waiting on the user
//! or has reached a terminal state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info, info_span, warn, Instrument};

use super::question_generator::{GenerationError, QuestionGenerator};
use super::reconciler::{ReconciliationError, Reconciler};
use crate::domain::session::{
    FailureReason, ReconcileStep, SessionError, SessionState, SurveySession,
};
use crate::domain::survey::Schema;
use crate::ports::{ResultExporter, TranscriptSink};

/// Policies for model-bound steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on one generation or reconciliation call.
    pub llm_timeout: Duration,
    /// Extra attempts with identical inputs after malformed model output.
    pub malformed_retries: u32,
    /// Reconciliation rounds before giving up.
    pub max_iterations: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(120),
            malformed_retries: 1,
            max_iterations: 10,
        }
    }
}

pub struct SurveyOrchestrator {
    generator: QuestionGenerator,
    reconciler: Reconciler,
    sink: Arc<dyn TranscriptSink>,
    exporter: Arc<dyn ResultExporter>,
    config: OrchestratorConfig,
}

impl SurveyOrchestrator {
    pub fn new(
        generator: QuestionGenerator,
        reconciler: Reconciler,
        sink: Arc<dyn TranscriptSink>,
        exporter: Arc<dyn ResultExporter>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            generator,
            reconciler,
            sink,
            exporter,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Hands the loaded schema to a fresh session and asks the first round
    /// of questions.
    pub async fn begin(&self, session: &mut SurveySession, schema: Schema) -> Result<(), SessionError> {
        let span = info_span!("survey_session", session_id = %session.id());
        async move {
            match session.schema_loaded(schema) {
                Ok(()) => {
                    info!(fields = session.schema().map(Schema::len).unwrap_or(0), "Schema loaded");
                }
                Err(SessionError::SchemaUnavailable(message)) => {
                    warn!(%message, "Schema rejected");
                    return self.fail(session, FailureReason::SchemaUnavailable).await;
                }
                Err(other) => return Err(other),
            }
            self.run_due_steps(session).await
        }
        .instrument(span)
        .await
    }

    /// Marks a session whose schema could not be loaded as failed.
    pub async fn abort_start(&self, session: &mut SurveySession, cause: &str) -> Result<(), SessionError> {
        let span = info_span!("survey_session", session_id = %session.id());
        async move {
            warn!(cause, "Form schema unavailable");
            self.fail(session, FailureReason::SchemaUnavailable).await
        }
        .instrument(span)
        .await
    }

    /// Runs any model-bound step the session is waiting on.
    pub async fn drive(&self, session: &mut SurveySession) -> Result<(), SessionError> {
        let span = info_span!("survey_session", session_id = %session.id());
        self.run_due_steps(session).instrument(span).await
    }

    /// Publishes transcript changes not yet seen by the sink.
    pub async fn flush(&self, session: &mut SurveySession) {
        let events = session.take_transcript_events();
        if !events.is_empty() {
            self.sink.publish(session.id(), events).await;
        }
    }

    async fn run_due_steps(&self, session: &mut SurveySession) -> Result<(), SessionError> {
        loop {
            match session.state() {
                SessionState::GeneratingQuestions => self.generation_step(session).await?,
                SessionState::Reconciling => self.reconciliation_step(session).await?,
                _ => break,
            }
        }
        self.flush(session).await;
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Generation
    // ════════════════════════════════════════════════════════════════════════

    async fn generation_step(&self, session: &mut SurveySession) -> Result<(), SessionError> {
        self.flush(session).await;
        let open = session
            .unanswered_schema()
            .ok_or_else(|| SessionError::invalid_state("no schema loaded"))?;
        let iteration = session.iteration();

        let mut retries = 0;
        loop {
            let result = timeout(
                self.config.llm_timeout,
                self.generator.generate(session.id(), &open),
            )
            .await;

            match result {
                Ok(Ok(turns)) => {
                    info!(iteration, batch_len = turns.len(), "Questions generated");
                    return session.questions_generated(turns);
                }
                Ok(Err(err)) if err.is_malformed() && retries < self.config.malformed_retries => {
                    retries += 1;
                    warn!(iteration, retry = retries, error = %err, "Retrying question generation");
                    session.announce_retry()?;
                    self.flush(session).await;
                }
                Ok(Err(err)) => {
                    error!(iteration, error = %err, "Question generation failed");
                    return self.fail(session, generation_failure(&err)).await;
                }
                Err(_) => {
                    error!(
                        iteration,
                        timeout_secs = self.config.llm_timeout.as_secs(),
                        "Question generation timed out"
                    );
                    return self.fail(session, FailureReason::Timeout).await;
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Reconciliation
    // ════════════════════════════════════════════════════════════════════════

    async fn reconciliation_step(&self, session: &mut SurveySession) -> Result<(), SessionError> {
        self.flush(session).await;
        let prior = session
            .schema()
            .cloned()
            .ok_or_else(|| SessionError::invalid_state("no schema loaded"))?;
        let batch = session.batch().to_vec();
        let history = session.transcript().messages().to_vec();
        let iteration = session.iteration();

        let mut retries = 0;
        let outcome = loop {
            let result = timeout(
                self.config.llm_timeout,
                self.reconciler.reconcile(session.id(), &prior, &batch, &history),
            )
            .await;

            match result {
                Ok(Ok(outcome)) => break outcome,
                Ok(Err(err)) if err.is_malformed() && retries < self.config.malformed_retries => {
                    retries += 1;
                    warn!(iteration, retry = retries, error = %err, "Retrying reconciliation");
                    session.announce_retry()?;
                    self.flush(session).await;
                }
                Ok(Err(err)) => {
                    error!(iteration, error = %err, "Reconciliation failed");
                    return self.fail(session, reconciliation_failure(&err)).await;
                }
                Err(_) => {
                    error!(
                        iteration,
                        timeout_secs = self.config.llm_timeout.as_secs(),
                        "Reconciliation timed out"
                    );
                    return self.fail(session, FailureReason::Timeout).await;
                }
            }
        };

        for contradiction in outcome.contradictions() {
            warn!(
                iteration,
                field_id = contradiction.field_id.as_ref().map(|f| f.as_str()).unwrap_or("-"),
                description = %contradiction.description,
                "Contradiction found"
            );
        }

        match session.apply_reconciliation(outcome, self.config.max_iterations)? {
            ReconcileStep::Completed => {
                info!(iteration, "Survey completed");
                self.finish(session).await;
                Ok(())
            }
            ReconcileStep::NextIteration(next) => {
                info!(
                    iteration = next,
                    open_fields = session.unanswered_schema().map(|s| s.len()).unwrap_or(0),
                    "Schema still incomplete, starting next round"
                );
                Ok(())
            }
            ReconcileStep::IterationLimitReached => {
                warn!(iteration, limit = self.config.max_iterations, "Iteration limit reached");
                self.fail(session, FailureReason::IterationLimitReached).await
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Terminal transitions
    // ════════════════════════════════════════════════════════════════════════

    async fn finish(&self, session: &mut SurveySession) {
        self.flush(session).await;
        let Some(answers) = session.answer_set().cloned() else {
            return;
        };

        self.sink.completed(session.id(), &answers).await;
        match self.exporter.export(session.id(), &answers).await {
            Ok(path) => info!(path = %path.display(), answers = answers.len(), "Answers exported"),
            Err(err) => error!(error = %err, "Failed to export answers"),
        }
    }

    async fn fail(&self, session: &mut SurveySession, reason: FailureReason) -> Result<(), SessionError> {
        session.fail(reason)?;
        error!(reason = %reason, "Session failed");
        self.flush(session).await;
        Ok(())
    }
}

fn generation_failure(err: &GenerationError) -> FailureReason {
    match err {
        GenerationError::Provider(_) | GenerationError::Prompt(_) => FailureReason::ProviderUnavailable,
        GenerationError::Malformed(_) | GenerationError::EmptyBatch | GenerationError::NothingToAsk => {
            FailureReason::MalformedGeneration
        }
    }
}

fn reconciliation_failure(err: &ReconciliationError) -> FailureReason {
    match err {
        ReconciliationError::Provider(_) | ReconciliationError::Prompt(_) => {
            FailureReason::ProviderUnavailable
        }
        ReconciliationError::Malformed(_) | ReconciliationError::InvalidRecords(_) => {
            FailureReason::MalformedReconciliation
        }
    }
}
