//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Configurable mock for testing
//! - `OpenAIProvider` - OpenAI and OpenAI-compatible servers (Ollama, vLLM)
//! - `AnthropicProvider` - Anthropic Claude models

mod anthropic_provider;
mod mock_provider;
mod openai_provider;
mod retry;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use retry::RetryPolicy;
