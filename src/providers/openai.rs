//! OpenAI-compatible chat completions client.
//!
//! One user message per call, non-streaming, blocking. Works against OpenAI,
//! Gemini's compatibility endpoint, and local servers (ollama, vLLM) hosting
//! DeepSeek, Llama or Qwen.

use super::ModelProvider;
use crate::llm::{LanguageModel, LlmError, LlmResponse};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiCompatClient {
    provider: String,
    model: String,
    base_url: String,
    api_key: String,
    http: Client,
}

impl OpenAiCompatClient {
    /// Create a client with an explicit key
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if the key is empty or the HTTP client
    /// cannot be built.
    pub fn new(
        provider: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let provider = provider.into();
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config(format!("{provider} API key is required")));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            provider,
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    /// Create a client for `provider`, falling back to its API key variable
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if no key is given or set in the environment.
    pub fn from_provider(
        provider: ModelProvider,
        api_key: Option<String>,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let env_value = provider
            .api_key_env()
            .and_then(|var| std::env::var(var).ok());
        let api_key = resolve_api_key(provider, api_key, env_value)?;
        Self::new(provider.as_str(), api_key, model, base_url, timeout)
    }

    /// Completion endpoint URL
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Explicit key wins, then the environment; blank values count as missing
fn resolve_api_key(
    provider: ModelProvider,
    explicit: Option<String>,
    env_value: Option<String>,
) -> Result<String, LlmError> {
    explicit
        .into_iter()
        .chain(env_value)
        .find(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            let var = provider.api_key_env().unwrap_or("API_KEY");
            LlmError::Config(format!(
                "{provider} API key is required (pass one or set {var})"
            ))
        })
}

/// Decode a chat completion body, keeping the raw JSON
fn parse_completion(
    provider: &str,
    model: &str,
    raw: serde_json::Value,
) -> Result<LlmResponse, LlmError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_value(raw.clone()).map_err(|e| LlmError::provider(provider, e))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| LlmError::provider(provider, "response contained no choices"))?;

    let (input_tokens, output_tokens) = parsed
        .usage
        .map_or((0, 0), |u| (u.prompt_tokens, u.completion_tokens));

    Ok(LlmResponse {
        content,
        model_name: model.to_string(),
        input_tokens,
        output_tokens,
        raw,
    })
}

impl LanguageModel for OpenAiCompatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str, temperature: f64) -> Result<LlmResponse, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        tracing::debug!(
            provider = %self.provider,
            model = %self.model,
            temperature,
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| LlmError::provider(&self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::provider(
                &self.provider,
                format!("HTTP {status}: {body}"),
            ));
        }

        let raw: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::provider(&self.provider, e))?;

        parse_completion(&self.provider, &self.model, raw)
    }
}
