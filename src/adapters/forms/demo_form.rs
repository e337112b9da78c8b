//! Built-in demo form, served in place of a real Google Form.

use async_trait::async_trait;

use crate::domain::foundation::FieldId;
use crate::domain::session::AccessToken;
use crate::domain::survey::{Field, FieldKind, FormReference, Schema};
use crate::ports::{FormSource, FormSourceError};

/// Serves the same six-question feedback survey for any form reference.
#[derive(Debug, Clone, Default)]
pub struct DemoFormSource;

impl DemoFormSource {
    pub fn new() -> Self {
        Self
    }

    pub fn schema() -> Result<Schema, FormSourceError> {
        let scale: Vec<String> = (1..=5).map(|n| n.to_string()).collect();
        let specs: [(&str, &str, FieldKind, bool, Vec<String>); 6] = [
            ("q1", "Full Name", FieldKind::ShortText, true, vec![]),
            ("q2", "Email Address", FieldKind::Email, true, vec![]),
            ("q3", "Age", FieldKind::Numeric, false, vec![]),
            ("q4", "Occupation", FieldKind::ShortText, false, vec![]),
            (
                "q5",
                "How satisfied are you with our service?",
                FieldKind::Scale,
                true,
                scale,
            ),
            ("q6", "Additional Comments", FieldKind::LongText, false, vec![]),
        ];

        let fields = specs
            .into_iter()
            .map(|(id, label, kind, required, options)| {
                let id = FieldId::new(id).map_err(invalid)?;
                Field::new(id, label, kind, required, options).map_err(invalid)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Schema::new("Customer Feedback Survey", None, fields).map_err(invalid)
    }
}

fn invalid(err: impl std::fmt::Display) -> FormSourceError {
    FormSourceError::InvalidPayload(err.to_string())
}

#[async_trait]
impl FormSource for DemoFormSource {
    async fn load_schema(
        &self,
        _form: &FormReference,
        _token: &AccessToken,
    ) -> Result<Schema, FormSourceError> {
        Self::schema()
    }
}
