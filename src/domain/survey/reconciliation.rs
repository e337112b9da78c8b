//! Reconciliation outcome - mapping model-produced field records back onto
//! a schema snapshot.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::{FieldId, ValidationError};

use super::{Field, FieldKind, Schema};

/// Errors raised while turning reconciliation records into a schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record {index} is not an object")]
    NotAnObject { index: usize },

    #[error("record {index} has no usable id or label")]
    MissingId { index: usize },

    #[error("record {index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ValidationError,
    },
}

/// An answer that conflicts with one recorded earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contradiction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<FieldId>,
    pub description: String,
}

impl Contradiction {
    /// Reads one entry of a `contradictionsFound` list.
    ///
    /// Accepts plain strings or objects with an optional field id and any of
    /// `description`, `message`, `reason`, `note`. Empty entries yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self {
                field_id: None,
                description: s.trim().to_string(),
            }),
            Value::Object(map) => {
                let field_id = ["fieldId", "field_id", "id"]
                    .iter()
                    .find_map(|k| map.get(*k))
                    .and_then(scalar_text)
                    .and_then(|s| FieldId::new(s).ok());

                let description = ["description", "message", "reason", "note"]
                    .iter()
                    .find_map(|k| map.get(*k))
                    .and_then(scalar_text)
                    .or_else(|| {
                        let previous = map.get("previous").and_then(scalar_text)?;
                        let current = map.get("new").or_else(|| map.get("current")).and_then(scalar_text)?;
                        Some(format!("'{}' conflicts with earlier answer '{}'", current, previous))
                    })?;

                Some(Self {
                    field_id,
                    description,
                })
            }
            _ => None,
        }
    }
}

/// The merged schema plus side signals from one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    schema: Schema,
    contradictions: Vec<Contradiction>,
    reported_complete: Option<bool>,
}

impl ReconciliationOutcome {
    /// Builds the next schema snapshot from the records the model returned.
    ///
    /// The record list is authoritative for which fields remain. Ids the
    /// prior snapshot knows keep their prior order; new ids follow in record
    /// order. Field kinds and options of ids the prior snapshot knows are
    /// carried over; unknown ids take the record's `type`, falling back to
    /// short text. Duplicate ids keep their first occurrence.
    pub fn from_records(
        prior: &Schema,
        records: &[Value],
        contradictions: Vec<Contradiction>,
        reported_complete: Option<bool>,
    ) -> Result<Self, RecordError> {
        let mut fields: Vec<Field> = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let map = record
                .as_object()
                .ok_or(RecordError::NotAnObject { index })?;

            let label_hint = map.get("label").and_then(scalar_text);
            let id = map
                .get("id")
                .and_then(scalar_text)
                .and_then(|s| FieldId::new(s).ok())
                .or_else(|| {
                    label_hint
                        .as_deref()
                        .and_then(|l| prior.field_by_label(l))
                        .map(|f| f.id().clone())
                })
                .ok_or(RecordError::MissingId { index })?;

            if fields.iter().any(|f| f.id() == &id) {
                continue;
            }

            let known = prior.field(&id);
            let label = label_hint
                .or_else(|| known.map(|f| f.label().to_string()))
                .unwrap_or_else(|| id.to_string());
            let required = map
                .get("required")
                .and_then(Value::as_bool)
                .or_else(|| known.map(|f| f.is_required()))
                .unwrap_or(false);

            let (kind, options) = match known {
                Some(f) => (f.kind(), f.options().to_vec()),
                None => {
                    let options = string_list(map.get("options"));
                    let kind = map
                        .get("type")
                        .and_then(Value::as_str)
                        .and_then(FieldKind::from_type_name)
                        .filter(|k| k.has_options() == !options.is_empty())
                        .unwrap_or(FieldKind::ShortText);
                    let options = if kind.has_options() { options } else { Vec::new() };
                    (kind, options)
                }
            };

            let field = Field::new(id, label, kind, required, options)
                .map_err(|source| RecordError::Invalid { index, source })?
                .with_answer(map.get("answer").and_then(answer_text));
            fields.push(field);
        }

        fields.sort_by_key(|field| {
            prior
                .fields()
                .iter()
                .position(|known| known.id() == field.id())
                .unwrap_or(usize::MAX)
        });

        let schema = Schema::new(
            prior.title(),
            prior.description().map(String::from),
            fields,
        )
        .map_err(|source| RecordError::Invalid { index: 0, source })?;

        Ok(Self {
            schema,
            contradictions,
            reported_complete,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn into_schema(self) -> Schema {
        self.schema
    }

    pub fn contradictions(&self) -> &[Contradiction] {
        &self.contradictions
    }

    /// The model's own `surveyComplete` flag, if it sent one. Advisory only.
    pub fn reported_complete(&self) -> Option<bool> {
        self.reported_complete
    }

    /// True iff every returned record carries a non-empty answer.
    pub fn is_filled(&self) -> bool {
        self.schema.is_complete()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Renders whatever the model put in `answer` as text.
fn answer_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(answer_text).collect();
            Some(parts.join(", "))
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_text).collect())
        .unwrap_or_default()
}
