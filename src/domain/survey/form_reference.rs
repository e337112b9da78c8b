//! Reference to an external form, parsed from a user-supplied link.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

const GOOGLE_FORMS_HOST: &str = "docs.google.com";
const GOOGLE_SHORT_HOST: &str = "forms.gle";

/// An opaque pointer to a form hosted by the form service.
///
/// Accepted links:
/// - `https://docs.google.com/forms/d/<id>/edit`
/// - `https://docs.google.com/forms/d/e/<id>/viewform`
/// - `https://forms.gle/<code>` (resolved by the form source adapter)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FormReference {
    /// A form id taken straight from the link.
    FormId(String),
    /// A short link that still needs to be followed to find the form id.
    ShortLink(String),
}

impl FormReference {
    /// Parses a form link.
    ///
    /// # Errors
    ///
    /// - `EmptyField` for a blank link
    /// - `InvalidFormat` for anything that is not a Google Forms link
    pub fn parse(link: &str) -> Result<Self, ValidationError> {
        let link = link.trim();
        if link.is_empty() {
            return Err(ValidationError::empty_field("form_link"));
        }

        let without_scheme = link
            .strip_prefix("https://")
            .or_else(|| link.strip_prefix("http://"))
            .unwrap_or(link);

        let (host, path) = match without_scheme.split_once('/') {
            Some((host, path)) => (host, path),
            None => (without_scheme, ""),
        };
        let host = host.to_ascii_lowercase();
        let path = path.split(['?', '#']).next().unwrap_or("");
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        match host.as_str() {
            GOOGLE_FORMS_HOST => {
                if segments.next() != Some("forms") || segments.next() != Some("d") {
                    return Err(invalid("expected a /forms/d/<id> path"));
                }
                let id = match segments.next() {
                    Some("e") => segments.next(),
                    other => other,
                };
                match id {
                    Some(id) if is_valid_id(id) => Ok(Self::FormId(id.to_string())),
                    _ => Err(invalid("missing form id")),
                }
            }
            GOOGLE_SHORT_HOST => match segments.next() {
                Some(code) if is_valid_id(code) => {
                    Ok(Self::ShortLink(format!("https://{}/{}", GOOGLE_SHORT_HOST, code)))
                }
                _ => Err(invalid("missing short link code")),
            },
            _ => Err(invalid("not a Google Forms link")),
        }
    }

    /// The form id, if it is already known.
    pub fn form_id(&self) -> Option<&str> {
        match self {
            Self::FormId(id) => Some(id),
            Self::ShortLink(_) => None,
        }
    }
}

impl fmt::Display for FormReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormId(id) => write!(f, "form:{}", id),
            Self::ShortLink(url) => write!(f, "{}", url),
        }
    }
}

fn is_valid_id(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn invalid(reason: &str) -> ValidationError {
    ValidationError::invalid_format("form_link", reason)
}
