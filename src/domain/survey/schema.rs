//! Schema - the ordered field list of one survey form.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::foundation::{FieldId, Percentage, ValidationError};

use super::Field;

/// A named, ordered sequence of fields representing one form.
///
/// Snapshots are immutable: reconciliation produces a new `Schema` rather
/// than editing this one, so consecutive iterations can be compared.
///
/// Serialized as `{ title, description, questions: [...] }`, the shape the
/// prompt templates and exports use.
///
/// # Invariants
///
/// - field ids are unique
/// - field order is iteration and display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "questions")]
    fields: Vec<Field>,
}

impl Schema {
    /// Creates a schema snapshot.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if two fields share an id
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        fields: Vec<Field>,
    ) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.id().clone()) {
                return Err(ValidationError::invalid_format(
                    "fields",
                    format!("duplicate field id '{}'", field.id()),
                ));
            }
        }

        let title = title.into().trim().to_string();
        Ok(Self {
            title: if title.is_empty() {
                "Untitled survey".to_string()
            } else {
                title
            },
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            fields,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by id.
    pub fn field(&self, id: &FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id() == id)
    }

    /// Looks up a field by its label, ignoring case and surrounding whitespace.
    pub fn field_by_label(&self, label: &str) -> Option<&Field> {
        let wanted = label.trim().to_lowercase();
        self.fields
            .iter()
            .find(|f| f.label().to_lowercase() == wanted)
    }

    /// Number of fields holding an answer.
    pub fn answered_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_answered()).count()
    }

    /// Share of fields holding an answer.
    pub fn progress(&self) -> Percentage {
        Percentage::from_ratio(self.answered_count(), self.fields.len())
    }

    /// The same schema restricted to fields without an answer, order kept.
    pub fn unanswered(&self) -> Schema {
        Schema {
            title: self.title.clone(),
            description: self.description.clone(),
            fields: self
                .fields
                .iter()
                .filter(|f| !f.is_answered())
                .cloned()
                .collect(),
        }
    }

    /// True iff every field carries a non-empty answer.
    ///
    /// Only meaningful on snapshots produced by reconciliation: that step
    /// decides which fields still exist and what counts as answered, so a
    /// reconciled snapshot with no unanswered element is complete even if it
    /// dropped fields the form source originally listed.
    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|f| f.is_answered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::survey::FieldKind;

    fn text_field(id: &str, label: &str, answer: Option<&str>) -> Field {
        Field::new(FieldId::new(id).unwrap(), label, FieldKind::ShortText, true, vec![])
            .unwrap()
            .with_answer(answer.map(String::from))
    }

    #[test]
    fn rejects_duplicate_ids() {
        let result = Schema::new(
            "Survey",
            None,
            vec![text_field("q1", "Name", None), text_field("q1", "Other", None)],
        );
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn blank_title_gets_placeholder() {
        let schema = Schema::new("  ", None, vec![]).unwrap();
        assert_eq!(schema.title(), "Untitled survey");
    }

    #[test]
    fn unanswered_keeps_order_and_drops_answered() {
        let schema = Schema::new(
            "Survey",
            None,
            vec![
                text_field("q1", "Name", Some("Ada")),
                text_field("q2", "Email", None),
                text_field("q3", "Age", None),
            ],
        )
        .unwrap();

        let open = schema.unanswered();
        let ids: Vec<&str> = open.fields().iter().map(|f| f.id().as_str()).collect();
        assert_eq!(ids, vec!["q2", "q3"]);
        assert_eq!(open.title(), "Survey");
    }

    #[test]
    fn complete_iff_every_field_answered() {
        let partial = Schema::new(
            "Survey",
            None,
            vec![text_field("q1", "Name", Some("Ada")), text_field("q2", "Email", None)],
        )
        .unwrap();
        assert!(!partial.is_complete());

        let full = Schema::new(
            "Survey",
            None,
            vec![
                text_field("q1", "Name", Some("Ada")),
                text_field("q2", "Email", Some("ada@example.com")),
            ],
        )
        .unwrap();
        assert!(full.is_complete());
    }

    #[test]
    fn empty_reconciled_schema_is_complete() {
        assert!(Schema::new("Survey", None, vec![]).unwrap().is_complete());
    }

    #[test]
    fn progress_counts_answered_fields() {
        let schema = Schema::new(
            "Survey",
            None,
            vec![
                text_field("q1", "Name", Some("Ada")),
                text_field("q2", "Email", None),
                text_field("q3", "Age", None),
                text_field("q4", "Job", Some("Engineer")),
            ],
        )
        .unwrap();
        assert_eq!(schema.progress().value(), 50);
    }

    #[test]
    fn finds_field_by_label_case_insensitively() {
        let schema = Schema::new("Survey", None, vec![text_field("q1", "Full Name", None)]).unwrap();
        assert_eq!(
            schema.field_by_label(" full name ").map(|f| f.id().as_str()),
            Some("q1")
        );
    }

    #[test]
    fn serializes_fields_as_questions() {
        let schema = Schema::new("Survey", None, vec![text_field("q1", "Name", None)]).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["questions"][0]["id"], "q1");
        assert_eq!(json["questions"][0]["type"], "shortText");
        assert!(json["questions"][0]["answer"].is_null());
        assert!(json.get("description").is_none());
    }
}
