//! Result exporter port - writes a completed session's answer set.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::foundation::SessionId;
use crate::domain::survey::AnswerSet;

/// Errors from exporting results.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("could not serialize answers: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Persists final answer sets.
#[async_trait]
pub trait ResultExporter: Send + Sync {
    /// Writes the answers and returns where they went.
    async fn export(&self, session_id: SessionId, answers: &AnswerSet) -> Result<PathBuf, ExportError>;
}
