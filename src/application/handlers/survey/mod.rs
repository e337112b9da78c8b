//! Survey handlers - the conversation-to-schema loop.
//!
//! `QuestionGenerator` and `Reconciler` wrap the two model calls,
//! `SurveyOrchestrator` sequences them around a session, and the command and
//! query handlers expose that to the HTTP layer.

mod completion;
mod export_results;
mod get_session;
mod orchestrator;
mod prompts;
mod question_generator;
mod reconciler;
mod start_survey;
mod submit_answer;

pub use export_results::{ExportResultsHandler, ExportResultsQuery};
pub use get_session::{GetSessionHandler, GetSessionQuery};
pub use orchestrator::{OrchestratorConfig, SurveyOrchestrator};
pub use prompts::{PromptError, PromptTemplates};
pub use question_generator::{GenerationError, QuestionGenerator};
pub use reconciler::{ReconciliationError, Reconciler};
pub use start_survey::{StartSurveyCommand, StartSurveyHandler};
pub use submit_answer::{SubmitAnswerCommand, SubmitAnswerHandler, SubmitAnswerResult};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::forms::DemoFormSource;
    use crate::adapters::storage::{ExportFormat, FileResultExporter, InMemorySessionRepository};
    use crate::adapters::transcript::RecordingTranscriptSink;
    use crate::domain::foundation::SessionId;
    use crate::domain::session::{AccessToken, SurveySession};
    use crate::ports::{AIProvider, SessionRepository};

    /// Handlers wired to a scripted model, the demo form and in-memory storage.
    pub struct Fixture {
        pub provider: MockAIProvider,
        pub repository: Arc<InMemorySessionRepository>,
        pub sink: Arc<RecordingTranscriptSink>,
        pub orchestrator: Arc<SurveyOrchestrator>,
        pub exports: TempDir,
    }

    impl Fixture {
        pub fn new(script: impl FnOnce(MockAIProvider) -> MockAIProvider) -> Self {
            let provider = script(MockAIProvider::new());
            let ai: Arc<dyn AIProvider> = Arc::new(provider.clone());
            let templates = Arc::new(PromptTemplates::default());
            let sink = Arc::new(RecordingTranscriptSink::new());
            let exports = tempfile::tempdir().unwrap();
            let orchestrator = Arc::new(SurveyOrchestrator::new(
                QuestionGenerator::new(ai.clone(), templates.clone(), 5, 4000),
                Reconciler::new(ai, templates, 4000),
                sink.clone(),
                Arc::new(FileResultExporter::new(exports.path(), ExportFormat::Json)),
                OrchestratorConfig {
                    llm_timeout: Duration::from_secs(5),
                    malformed_retries: 1,
                    max_iterations: 5,
                },
            ));
            Self {
                provider,
                repository: Arc::new(InMemorySessionRepository::new()),
                sink,
                orchestrator,
                exports,
            }
        }

        /// Starts a session on the demo form and returns its id.
        pub async fn started_session(&self) -> SessionId {
            let handler = StartSurveyHandler::new(
                Arc::new(DemoFormSource::new()),
                self.repository.clone(),
                self.orchestrator.clone(),
            );
            handler
                .handle(StartSurveyCommand {
                    form_link: "https://forms.gle/demo".to_string(),
                    consent: true,
                    access_token: AccessToken::new("token"),
                })
                .await
                .unwrap()
                .id()
        }

        pub async fn snapshot(&self, id: SessionId) -> SurveySession {
            let shared = self.repository.find(&id).await.unwrap().unwrap();
            let session = shared.lock().await;
            session.clone()
        }
    }

    /// A generation reply with one question per field id.
    pub fn questions_for(ids: &[&str]) -> String {
        let items: Vec<_> = ids
            .iter()
            .map(|id| json!({"fieldId": id, "question": format!("Tell me about {}?", id)}))
            .collect();
        json!({ "questions": items }).to_string()
    }
}
