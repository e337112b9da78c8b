//! Survey session loop configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::storage::ExportFormat;

/// Limits and outputs of the generate/collect/reconcile loop.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Maximum questions per generated batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Timeout for each model call, in seconds
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,

    /// Extra attempts when the model output cannot be used
    #[serde(default = "default_malformed_retries")]
    pub malformed_output_retries: u32,

    /// Generate/collect/reconcile rounds before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Cap on sessions held in memory; finished ones are evicted first
    pub max_sessions: Option<usize>,

    /// How long completed or failed sessions stay readable, in seconds
    #[serde(default = "default_finished_retention")]
    pub finished_retention_secs: u64,

    /// Directory for exported answer sets
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default)]
    pub export_format: ExportFormat,

    /// YAML file overriding the built-in prompt templates
    pub prompt_file: Option<PathBuf>,
}

impl SessionConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn finished_retention(&self) -> Duration {
        Duration::from_secs(self.finished_retention_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=10).contains(&self.batch_size) {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.llm_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_iterations == 0 {
            return Err(ValidationError::InvalidMaxIterations);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            llm_timeout_secs: default_llm_timeout(),
            malformed_output_retries: default_malformed_retries(),
            max_iterations: default_max_iterations(),
            max_sessions: None,
            finished_retention_secs: default_finished_retention(),
            export_dir: default_export_dir(),
            export_format: ExportFormat::default(),
            prompt_file: None,
        }
    }
}

fn default_batch_size() -> usize {
    5
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_malformed_retries() -> u32 {
    1
}

fn default_max_iterations() -> u32 {
    10
}

fn default_finished_retention() -> u64 {
    3600
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("./exports")
}
