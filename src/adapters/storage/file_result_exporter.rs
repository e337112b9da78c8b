//! File-based Result Exporter Adapter
//!
//! Writes a completed session's answers to
//! `<base_path>/<session_id>/survey-responses.{json,yaml}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::SessionId;
use crate::domain::survey::AnswerSet;
use crate::ports::{ExportError, ResultExporter};

const FILE_STEM: &str = "survey-responses";

/// Output format for exported answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl ExportFormat {
    fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    fn render(&self, answers: &AnswerSet) -> Result<String, ExportError> {
        match self {
            Self::Json => answers
                .to_json_document()
                .map_err(|e| ExportError::Serialization(e.to_string())),
            Self::Yaml => {
                serde_yaml::to_string(answers).map_err(|e| ExportError::Serialization(e.to_string()))
            }
        }
    }
}

/// File-based storage for final answer sets
#[derive(Debug, Clone)]
pub struct FileResultExporter {
    base_path: PathBuf,
    format: ExportFormat,
}

impl FileResultExporter {
    /// Create an exporter rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let exporter = FileResultExporter::new("./exports", ExportFormat::Json);
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P, format: ExportFormat) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            format,
        }
    }

    fn session_dir(&self, session_id: SessionId) -> PathBuf {
        self.base_path.join(session_id.to_string())
    }

    fn file_path(&self, session_id: SessionId) -> PathBuf {
        self.session_dir(session_id)
            .join(format!("{}.{}", FILE_STEM, self.format.extension()))
    }
}

#[async_trait]
impl ResultExporter for FileResultExporter {
    async fn export(&self, session_id: SessionId, answers: &AnswerSet) -> Result<PathBuf, ExportError> {
        let content = self.format.render(answers)?;

        fs::create_dir_all(self.session_dir(session_id))
            .await
            .map_err(|e| ExportError::Io(e.to_string()))?;

        let path = self.file_path(session_id);
        fs::write(&path, content)
            .await
            .map_err(|e| ExportError::Io(e.to_string()))?;

        Ok(path)
    }
}
