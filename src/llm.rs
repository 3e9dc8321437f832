//! Language-model port.
//!
//! Every prompting strategy talks to a model exclusively through
//! [`LanguageModel::generate`]. Concrete clients live in [`crate::providers`];
//! tests plug in scripted mocks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a language-model port
#[derive(Error, Debug)]
pub enum LlmError {
    /// Missing credentials, unknown provider, or a tool that is not installed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport, HTTP status, decoding or subprocess failure
    #[error("{provider} API error: {source}")]
    Provider {
        provider: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LlmError {
    /// Wrap an underlying failure as a provider error
    pub fn provider(
        provider: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            source: source.into(),
        }
    }

    /// Whether this error stems from configuration rather than the provider
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// One completion returned by a port
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text
    pub content: String,
    /// Model that produced the completion
    pub model_name: String,
    /// Prompt tokens billed for this call
    pub input_tokens: u64,
    /// Completion tokens billed for this call
    pub output_tokens: u64,
    /// Provider payload, kept opaque
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl LlmResponse {
    /// Build a response without a raw payload
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        model_name: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        Self {
            content: content.into(),
            model_name: model_name.into(),
            input_tokens,
            output_tokens,
            raw: serde_json::Value::Null,
        }
    }
}

/// The single capability strategies need from a model: one completion per prompt
pub trait LanguageModel {
    /// Model identifier used for reporting
    fn model_name(&self) -> &str;

    /// Generate one completion for `prompt` at `temperature`
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Provider`] on transport or decoding failure.
    fn generate(&self, prompt: &str, temperature: f64) -> Result<LlmResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_keeps_source() {
        let io = std::io::Error::other("connection reset");
        let err = LlmError::provider("gpt", io);
        let msg = err.to_string();
        assert!(msg.contains("gpt"));
        assert!(msg.contains("connection reset"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_config());
    }

    #[test]
    fn test_provider_error_from_string() {
        let err = LlmError::provider("gemini", "empty choices");
        assert!(err.to_string().contains("empty choices"));
    }

    #[test]
    fn test_config_error_display() {
        let err = LlmError::Config("OpenAI API key is required".to_string());
        assert!(err.is_config());
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_llm_response_new() {
        let response = LlmResponse::new("Paris", "mock", 10, 5);
        assert_eq!(response.content, "Paris");
        assert_eq!(response.input_tokens + response.output_tokens, 15);
        assert!(response.raw.is_null());
    }
}
