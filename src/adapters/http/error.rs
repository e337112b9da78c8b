//! Error body shared by every endpoint, and the `SessionError` status mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::session::SessionError;

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl ToString, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&SessionError> for ErrorResponse {
    fn from(error: &SessionError) -> Self {
        Self::new(error.code(), error.message())
    }
}

/// HTTP status for an application error.
pub fn session_error_status(error: &SessionError) -> StatusCode {
    match error {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::Unauthorized => StatusCode::UNAUTHORIZED,
        SessionError::InvalidState(_) | SessionError::NotCompleted(_) => StatusCode::CONFLICT,
        SessionError::SchemaUnavailable(_) => StatusCode::BAD_GATEWAY,
        SessionError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        SessionError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn handle_session_error(error: SessionError) -> Response {
    let status = session_error_status(&error);
    if status.is_server_error() {
        tracing::error!(code = %error.code(), "Request failed: {}", error);
    }
    (status, Json(ErrorResponse::from(&error))).into_response()
}
