//! Concrete [`LanguageModel`] implementations.
//!
//! - [`OpenAiCompatClient`]: hosted and self-hosted models behind an
//!   OpenAI-compatible `/chat/completions` endpoint (GPT, Gemini, DeepSeek,
//!   Llama, Qwen)
//! - [`CliModel`]: offline-first port shelling out to an installed CLI
//!   (`claude`, `gemini`)

pub mod cli;
pub mod openai;

pub use cli::{CliModel, CliToolConfig};
pub use openai::OpenAiCompatClient;

use crate::config::AppConfig;
use crate::llm::{LanguageModel, LlmError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Model providers this crate can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelProvider {
    /// OpenAI chat completions
    Gpt,
    /// Google Gemini (OpenAI-compatible surface)
    Gemini,
    /// DeepSeek on the local OpenAI-compatible server
    DeepSeek,
    /// Llama on the local OpenAI-compatible server
    Llama,
    /// Qwen on the local OpenAI-compatible server
    Qwen,
    /// `claude` CLI
    ClaudeCli,
    /// `gemini` CLI
    GeminiCli,
}

impl ModelProvider {
    /// All providers
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Gpt,
            Self::Gemini,
            Self::DeepSeek,
            Self::Llama,
            Self::Qwen,
            Self::ClaudeCli,
            Self::GeminiCli,
        ]
    }

    /// Canonical name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
            Self::Llama => "llama",
            Self::Qwen => "qwen",
            Self::ClaudeCli => "claude-cli",
            Self::GeminiCli => "gemini-cli",
        }
    }

    /// Environment variable holding the API key, if the provider needs one
    #[must_use]
    pub const fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Gpt => Some("OPENAI_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::DeepSeek | Self::Llama | Self::Qwen => Some("API_KEY"),
            Self::ClaudeCli | Self::GeminiCli => None,
        }
    }

    /// Default model name taken from configuration
    #[must_use]
    pub fn default_model(self, config: &AppConfig) -> String {
        match self {
            Self::Gpt => config.models.gpt.clone(),
            Self::Gemini => config.models.gemini.clone(),
            Self::DeepSeek => config.models.deepseek.clone(),
            Self::Llama => config.models.llama.clone(),
            Self::Qwen => config.models.qwen.clone(),
            Self::ClaudeCli => "claude".to_string(),
            Self::GeminiCli => "gemini".to_string(),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gpt" | "openai" => Ok(Self::Gpt),
            "gemini" | "google" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            "llama" | "ollama" => Ok(Self::Llama),
            "qwen" => Ok(Self::Qwen),
            "claude-cli" | "claude_cli" | "claude" => Ok(Self::ClaudeCli),
            "gemini-cli" | "gemini_cli" => Ok(Self::GeminiCli),
            _ => Err(LlmError::Config(format!("Unknown provider: {s}"))),
        }
    }
}

/// Construct the port for `provider`.
///
/// `model` overrides the configured default; `api_key` overrides the
/// provider's environment variable.
///
/// # Errors
///
/// Returns [`LlmError::Config`] when credentials are missing or the CLI tool
/// is not installed.
pub fn build_model(
    provider: ModelProvider,
    model: Option<&str>,
    api_key: Option<String>,
    config: &AppConfig,
) -> Result<Arc<dyn LanguageModel>, LlmError> {
    let model = model.map_or_else(|| provider.default_model(config), str::to_string);
    let timeout = Duration::from_secs(config.experiment.timeout_secs);

    tracing::debug!(provider = %provider, model = %model, "Building model port");

    let port: Arc<dyn LanguageModel> = match provider {
        ModelProvider::Gpt | ModelProvider::Gemini => {
            let endpoint = if provider == ModelProvider::Gpt {
                &config.llm.openai
            } else {
                &config.llm.gemini
            };
            Arc::new(OpenAiCompatClient::from_provider(
                provider,
                api_key,
                &model,
                &endpoint.base_url,
                timeout,
            )?)
        }
        ModelProvider::DeepSeek | ModelProvider::Llama | ModelProvider::Qwen => {
            Arc::new(OpenAiCompatClient::from_provider(
                provider,
                api_key,
                &model,
                &config.llm.local.base_url,
                timeout,
            )?)
        }
        ModelProvider::ClaudeCli => Arc::new(CliModel::claude(timeout).checked()?),
        ModelProvider::GeminiCli => Arc::new(CliModel::gemini(timeout).checked()?),
    };

    Ok(port)
}
