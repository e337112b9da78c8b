//! Reconciler - merges a round of answers back into the schema.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::completion;
use super::prompts::{PromptError, PromptTemplates};
use crate::domain::conversation::{
    ChatMessage, ConversationTurn, DataExtractor, ExtractionError, QUESTIONS_KEY,
};
use crate::domain::foundation::SessionId;
use crate::domain::survey::{Contradiction, ReconciliationOutcome, RecordError, Schema};
use crate::ports::{AIError, AIProvider, CompletionRequest, MessageRole, RequestMetadata, RequestPurpose};

const CONTRADICTIONS_KEY: &str = "contradictionsFound";
const COMPLETE_KEY: &str = "surveyComplete";

/// Why a reconciliation pass produced no usable schema.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("could not build the reconciliation prompt: {0}")]
    Prompt(#[from] PromptError),

    #[error("model call failed: {0}")]
    Provider(#[from] AIError),

    #[error("model output had no field list: {0}")]
    Malformed(#[from] ExtractionError),

    #[error("model returned unusable field records: {0}")]
    InvalidRecords(#[from] RecordError),
}

impl ReconciliationError {
    /// True when the model answered but its text could not be used.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::InvalidRecords(_))
    }
}

/// Asks the model to fold the answered batch into the schema.
pub struct Reconciler {
    ai_provider: Arc<dyn AIProvider>,
    templates: Arc<PromptTemplates>,
    extractor: DataExtractor,
    max_tokens: u32,
}

impl Reconciler {
    pub fn new(ai_provider: Arc<dyn AIProvider>, templates: Arc<PromptTemplates>, max_tokens: u32) -> Self {
        Self {
            ai_provider,
            templates,
            extractor: DataExtractor::new(),
            max_tokens,
        }
    }

    /// Reconciles `batch` against `prior`, the snapshot active when the
    /// batch was generated.
    ///
    /// The returned outcome's field list is whatever the model sent back;
    /// it is filled iff every returned field carries an answer.
    pub async fn reconcile(
        &self,
        session_id: SessionId,
        prior: &Schema,
        batch: &[ConversationTurn],
        history: &[ChatMessage],
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let prompt = self.templates.render_reconciliation(prior, batch, history)?;
        let request = CompletionRequest::new(RequestMetadata::new(
            session_id,
            RequestPurpose::Reconciliation,
            Uuid::new_v4().to_string(),
        ))
        .with_message(MessageRole::User, prompt)
        .with_max_tokens(self.max_tokens);

        let response = completion::complete(self.ai_provider.as_ref(), request).await?;
        debug!(session_id = %session_id, batch_len = batch.len(), "Reconciliation response received");

        let mut payload = self.extractor.extract_payload(&response.content)?;
        let records = match payload.remove(QUESTIONS_KEY) {
            Some(Value::Array(records)) => records,
            _ => return Err(ExtractionError::MissingField(QUESTIONS_KEY.to_string()).into()),
        };

        let contradictions = read_contradictions(payload.get(CONTRADICTIONS_KEY));
        let reported_complete = payload.get(COMPLETE_KEY).and_then(Value::as_bool);

        let outcome =
            ReconciliationOutcome::from_records(prior, &records, contradictions, reported_complete)?;

        if let Some(reported) = outcome.reported_complete() {
            if reported != outcome.is_filled() {
                warn!(
                    session_id = %session_id,
                    reported,
                    filled = outcome.is_filled(),
                    "Model completion flag disagrees with its field list; using the field list"
                );
            }
        }
        Ok(outcome)
    }
}

/// Reads `contradictionsFound`, which models send as a list, a single
/// entry, or a bare boolean.
fn read_contradictions(value: Option<&Value>) -> Vec<Contradiction> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Contradiction::from_value).collect(),
        Some(Value::Bool(true)) => vec![Contradiction {
            field_id: None,
            description: "Some of your answers conflict with earlier ones.".to_string(),
        }],
        Some(other) => Contradiction::from_value(other).into_iter().collect(),
        None => Vec::new(),
    }
}
