//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Request timeout must be at least the LLM call timeout")]
    RequestTimeoutBelowLlmTimeout,

    #[error("No AI provider configured")]
    NoAiProviderConfigured,

    #[error("Question batch size must be between 1 and 10")]
    InvalidBatchSize,

    #[error("Max iterations must be at least 1")]
    InvalidMaxIterations,

    #[error("OAuth redirect URI must use HTTPS in production")]
    RedirectUriMustBeHttps,
}
