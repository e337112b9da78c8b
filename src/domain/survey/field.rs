//! Field - one question slot of a survey form.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{FieldId, ValidationError};

/// What kind of answer a field expects.
///
/// Wire names follow the normalized schema the form source produces
/// (`shortText`, `longText`, `number`, `email`, `singleChoice`, `scale`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    ShortText,
    LongText,
    #[serde(rename = "number")]
    Numeric,
    Email,
    SingleChoice,
    Scale,
}

impl FieldKind {
    /// Returns true if the field offers a fixed option list.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::Scale)
    }

    /// Lenient mapping from the type strings form sources and models emit.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "shorttext" | "text" | "string" | "shortanswer" => Some(Self::ShortText),
            "longtext" | "paragraph" | "textarea" => Some(Self::LongText),
            "number" | "numeric" | "integer" => Some(Self::Numeric),
            "email" => Some(Self::Email),
            "singlechoice" | "multiplechoice" | "choice" | "radio" | "dropdown" | "select" => {
                Some(Self::SingleChoice)
            }
            "scale" | "linearscale" | "rating" => Some(Self::Scale),
            _ => None,
        }
    }
}

/// One survey question slot together with its current answer state.
///
/// # Invariants
///
/// - `options` is non-empty iff `kind` is single-choice or scale
/// - `answer`, when present, is non-blank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    id: FieldId,
    label: String,
    #[serde(rename = "type")]
    kind: FieldKind,
    required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,
    answer: Option<String>,
}

impl Field {
    /// Creates an unanswered field.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the label is blank
    /// - `InvalidFormat` if options are missing for a choice/scale field or
    ///   present on any other kind
    pub fn new(
        id: FieldId,
        label: impl Into<String>,
        kind: FieldKind,
        required: bool,
        options: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let label = label.into().trim().to_string();
        if label.is_empty() {
            return Err(ValidationError::empty_field("label"));
        }

        let options: Vec<String> = options
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if kind.has_options() && options.is_empty() {
            return Err(ValidationError::invalid_format(
                "options",
                format!("field '{}' of kind {:?} requires options", id, kind),
            ));
        }
        if !kind.has_options() && !options.is_empty() {
            return Err(ValidationError::invalid_format(
                "options",
                format!("field '{}' of kind {:?} cannot carry options", id, kind),
            ));
        }

        Ok(Self {
            id,
            label,
            kind,
            required,
            options,
            answer: None,
        })
    }

    /// Returns a copy of this field carrying the given answer.
    ///
    /// Blank answers are stored as "no answer".
    pub fn with_answer(mut self, answer: Option<String>) -> Self {
        self.answer = answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        self
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// True when the field holds a non-blank answer.
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}
