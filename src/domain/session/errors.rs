//! Session-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, SessionId, ValidationError};

/// Session-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session was not found.
    NotFound(SessionId),
    /// Caller has no usable credential.
    Unauthorized,
    /// Operation does not fit the current session state.
    InvalidState(String),
    /// Operation needs a completed session.
    NotCompleted(SessionId),
    /// The form could not be loaded.
    SchemaUnavailable(String),
    /// Validation failed.
    ValidationFailed { field: String, message: String },
    /// Infrastructure error.
    Infrastructure(String),
}

impl SessionError {
    pub fn not_found(id: SessionId) -> Self {
        SessionError::NotFound(id)
    }
    pub fn unauthorized() -> Self {
        SessionError::Unauthorized
    }
    pub fn invalid_state(message: impl Into<String>) -> Self {
        SessionError::InvalidState(message.into())
    }
    pub fn not_completed(id: SessionId) -> Self {
        SessionError::NotCompleted(id)
    }
    pub fn schema_unavailable(message: impl Into<String>) -> Self {
        SessionError::SchemaUnavailable(message.into())
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        SessionError::Infrastructure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionError::Unauthorized => ErrorCode::Unauthorized,
            SessionError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            SessionError::NotCompleted(_) => ErrorCode::SessionNotCompleted,
            SessionError::SchemaUnavailable(_) => ErrorCode::SchemaUnavailable,
            SessionError::ValidationFailed { field, .. } if field == "form_link" => {
                ErrorCode::InvalidFormLink
            }
            SessionError::ValidationFailed { field, .. } if field == "consent" => {
                ErrorCode::ConsentRequired
            }
            SessionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SessionError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            SessionError::NotFound(id) => format!("Session not found: {}", id),
            SessionError::Unauthorized => "Missing or invalid access token".to_string(),
            SessionError::InvalidState(msg) => format!("Invalid state: {}", msg),
            SessionError::NotCompleted(id) => format!("Session {} has not completed", id),
            SessionError::SchemaUnavailable(msg) => format!("Survey unavailable: {}", msg),
            SessionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SessionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SessionError {}

impl From<SessionError> for DomainError {
    fn from(err: SessionError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                SessionError::validation(field, "must not be empty")
            }
            ValidationError::OutOfRange { field, min, max, actual } => SessionError::validation(
                field,
                format!("{} is outside {}..={}", actual, min, max),
            ),
            ValidationError::InvalidFormat { field, reason } => SessionError::validation(field, reason),
        }
    }
}
