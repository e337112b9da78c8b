//! Form source port - loads a survey schema from the form service.
//!
//! The session treats any failure here as `SchemaUnavailable`: it never
//! proceeds to question generation without a schema.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::AccessToken;
use crate::domain::survey::{FormReference, Schema};

/// Errors from loading a form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormSourceError {
    #[error("form not found: {0}")]
    NotFound(String),

    #[error("access to the form was denied")]
    AccessDenied,

    #[error("form has no supported questions")]
    NoQuestions,

    #[error("could not resolve short link: {0}")]
    UnresolvedLink(String),

    #[error("form service error: {0}")]
    Upstream(String),

    #[error("unexpected form payload: {0}")]
    InvalidPayload(String),
}

/// Loads and normalizes a form into a `Schema`.
#[async_trait]
pub trait FormSource: Send + Sync {
    /// Fetches the form referenced by `form`.
    ///
    /// # Errors
    ///
    /// - `AccessDenied` when the token is rejected
    /// - `NotFound` for unknown form ids
    /// - `NoQuestions` if nothing in the form maps to a field
    async fn load_schema(
        &self,
        form: &FormReference,
        token: &AccessToken,
    ) -> Result<Schema, FormSourceError>;
}
