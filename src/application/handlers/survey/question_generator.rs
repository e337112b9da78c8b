//! QuestionGenerator - turns the still-open fields into a question batch.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::completion;
use super::prompts::{PromptError, PromptTemplates};
use crate::domain::conversation::{ConversationTurn, DataExtractor, ExtractionError};
use crate::domain::foundation::{FieldId, SessionId};
use crate::domain::survey::Schema;
use crate::ports::{AIError, AIProvider, CompletionRequest, MessageRole, RequestMetadata, RequestPurpose};

/// Why a question batch could not be produced.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Nothing left to ask; callers should not request a batch.
    #[error("every field is already answered")]
    NothingToAsk,

    #[error("could not build the generation prompt: {0}")]
    Prompt(#[from] PromptError),

    #[error("model call failed: {0}")]
    Provider(#[from] AIError),

    #[error("model output had no usable questions: {0}")]
    Malformed(#[from] ExtractionError),

    #[error("model returned an empty question batch")]
    EmptyBatch,
}

impl GenerationError {
    /// True when the model answered but its text could not be used.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::EmptyBatch)
    }
}

/// Asks the model for the next round of questions.
pub struct QuestionGenerator {
    ai_provider: Arc<dyn AIProvider>,
    templates: Arc<PromptTemplates>,
    extractor: DataExtractor,
    batch_limit: usize,
    max_tokens: u32,
}

impl QuestionGenerator {
    pub fn new(
        ai_provider: Arc<dyn AIProvider>,
        templates: Arc<PromptTemplates>,
        batch_limit: usize,
        max_tokens: u32,
    ) -> Self {
        Self {
            ai_provider,
            templates,
            extractor: DataExtractor::new(),
            batch_limit: batch_limit.max(1),
            max_tokens,
        }
    }

    pub fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    /// Generates questions for `open`, which must hold only unanswered fields.
    ///
    /// The batch keeps the model's order and is capped at the batch limit.
    /// Field hints that do not name an open field are dropped.
    pub async fn generate(
        &self,
        session_id: SessionId,
        open: &Schema,
    ) -> Result<Vec<ConversationTurn>, GenerationError> {
        if open.is_empty() {
            return Err(GenerationError::NothingToAsk);
        }

        let prompt = self.templates.render_generation(open, self.batch_limit)?;
        let request = CompletionRequest::new(RequestMetadata::new(
            session_id,
            RequestPurpose::QuestionGeneration,
            Uuid::new_v4().to_string(),
        ))
        .with_message(MessageRole::User, prompt)
        .with_max_tokens(self.max_tokens);

        let response = completion::complete(self.ai_provider.as_ref(), request).await?;
        debug!(session_id = %session_id, open_fields = open.len(), "Question generation response received");

        let records = self.extractor.extract_questions(&response.content)?;
        let turns = self.build_batch(session_id, open, &records);
        if turns.is_empty() {
            return Err(GenerationError::EmptyBatch);
        }
        Ok(turns)
    }

    fn build_batch(
        &self,
        session_id: SessionId,
        open: &Schema,
        records: &[serde_json::Value],
    ) -> Vec<ConversationTurn> {
        let open_ids: HashSet<&FieldId> = open.fields().iter().map(|f| f.id()).collect();

        let mut turns: Vec<ConversationTurn> = records
            .iter()
            .filter_map(ConversationTurn::from_generated)
            .map(|mut turn| {
                if let Some(hint) = &turn.field_hint {
                    if !open_ids.contains(hint) {
                        warn!(session_id = %session_id, field_hint = %hint, "Dropping hint for a field that is not open");
                        turn.field_hint = None;
                    }
                }
                turn
            })
            .collect();

        if turns.len() > self.batch_limit {
            debug!(
                session_id = %session_id,
                returned = turns.len(),
                limit = self.batch_limit,
                "Truncating question batch"
            );
            turns.truncate(self.batch_limit);
        }
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::survey::{Field, FieldKind};
    use serde_json::json;

    fn open_schema(ids: &[&str]) -> Schema {
        let fields = ids
            .iter()
            .map(|id| {
                Field::new(FieldId::new(*id).unwrap(), format!("Label {}", id), FieldKind::ShortText, true, vec![])
                    .unwrap()
            })
            .collect();
        Schema::new("Survey", None, fields).unwrap()
    }

    fn generator(provider: MockAIProvider, limit: usize) -> QuestionGenerator {
        QuestionGenerator::new(Arc::new(provider), Arc::new(PromptTemplates::default()), limit, 4000)
    }

    mod batches {
        use super::*;

        #[tokio::test]
        async fn keeps_model_order_and_metadata() {
            let response = json!({
                "questions": [
                    {"fieldId": "q2", "question": "What's your email?", "intent": "contact"},
                    {"fieldId": "q1", "question": "What should I call you?", "description": "First name is fine"}
                ]
            })
            .to_string();
            let generator = generator(MockAIProvider::new().with_response(response), 5);

            let turns = generator
                .generate(SessionId::new(), &open_schema(&["q1", "q2"]))
                .await
                .unwrap();

            assert_eq!(turns.len(), 2);
            assert_eq!(turns[0].question_text, "What's your email?");
            assert_eq!(turns[0].field_hint.as_ref().map(FieldId::as_str), Some("q2"));
            assert_eq!(turns[0].intent.as_deref(), Some("contact"));
            assert_eq!(turns[1].description.as_deref(), Some("First name is fine"));
            assert!(turns.iter().all(|t| t.answer_text.is_none()));
        }

        #[tokio::test]
        async fn caps_batch_at_limit() {
            let questions: Vec<_> = (1..=8)
                .map(|i| json!({"fieldId": format!("q{}", i), "question": format!("Question {}?", i)}))
                .collect();
            let response = json!({ "questions": questions }).to_string();
            let ids: Vec<String> = (1..=8).map(|i| format!("q{}", i)).collect();
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();

            let turns = generator(MockAIProvider::new().with_response(response), 5)
                .generate(SessionId::new(), &open_schema(&ids))
                .await
                .unwrap();

            assert_eq!(turns.len(), 5);
            assert_eq!(turns[4].question_text, "Question 5?");
        }

        #[tokio::test]
        async fn drops_hints_outside_open_fields() {
            let response = r#"```json
{"questions": [{"fieldId": "q9", "question": "Anything else?"}, {"fieldId": "q1", "question": "Name?"}]}
```"#;
            let turns = generator(MockAIProvider::new().with_response(response), 5)
                .generate(SessionId::new(), &open_schema(&["q1"]))
                .await
                .unwrap();

            assert_eq!(turns[0].field_hint, None);
            assert_eq!(turns[1].field_hint.as_ref().map(FieldId::as_str), Some("q1"));
        }

        #[tokio::test]
        async fn prompt_only_mentions_open_fields() {
            let provider = MockAIProvider::new().with_response(r#"{"questions": ["Email?"]}"#);
            let generator = generator(provider.clone(), 5);

            generator
                .generate(SessionId::new(), &open_schema(&["q2"]))
                .await
                .unwrap();

            let calls = provider.get_calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].metadata.purpose, RequestPurpose::QuestionGeneration);
            assert_eq!(calls[0].max_tokens, Some(4000));
            let prompt = calls[0].prompt_text();
            assert!(prompt.contains("Label q2"));
            assert!(!prompt.contains("Label q1"));
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn unparseable_text_is_malformed() {
            let err = generator(MockAIProvider::new().with_response("not json at all"), 5)
                .generate(SessionId::new(), &open_schema(&["q1"]))
                .await
                .unwrap_err();
            assert!(err.is_malformed());
        }

        #[tokio::test]
        async fn empty_questions_array_is_malformed_not_complete() {
            let err = generator(MockAIProvider::new().with_response(r#"{"questions": []}"#), 5)
                .generate(SessionId::new(), &open_schema(&["q1"]))
                .await
                .unwrap_err();
            assert!(matches!(err, GenerationError::EmptyBatch));
            assert!(err.is_malformed());
        }

        #[tokio::test]
        async fn provider_error_is_not_malformed() {
            let provider = MockAIProvider::new().with_error(MockError::AuthenticationFailed);
            let err = generator(provider, 5)
                .generate(SessionId::new(), &open_schema(&["q1"]))
                .await
                .unwrap_err();
            assert!(matches!(err, GenerationError::Provider(AIError::AuthenticationFailed)));
            assert!(!err.is_malformed());
        }

        #[tokio::test]
        async fn refuses_to_ask_about_nothing() {
            let provider = MockAIProvider::new();
            let err = generator(provider.clone(), 5)
                .generate(SessionId::new(), &open_schema(&[]))
                .await
                .unwrap_err();
            assert!(matches!(err, GenerationError::NothingToAsk));
            assert_eq!(provider.call_count(), 0);
        }
    }
}
