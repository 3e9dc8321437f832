//! Configuration module for providers, model defaults and experiment settings.
//!
//! Loaded once from YAML at startup and passed by reference to whatever needs
//! a base URL or a default model name. There is no global instance.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Provider endpoints
    #[serde(default)]
    pub llm: LlmEndpoints,
    /// Default model per provider
    #[serde(default)]
    pub models: ModelDefaults,
    /// Experiment settings
    #[serde(default)]
    pub experiment: ExperimentSettings,
}

/// Endpoint configuration for every provider family
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LlmEndpoints {
    /// OpenAI-compatible server for self-hosted models (deepseek, llama, qwen)
    #[serde(default = "default_local_endpoint")]
    pub local: Endpoint,
    /// OpenAI
    #[serde(default = "default_openai_endpoint")]
    pub openai: Endpoint,
    /// Gemini's OpenAI-compatible surface
    #[serde(default = "default_gemini_endpoint")]
    pub gemini: Endpoint,
}

impl Default for LlmEndpoints {
    fn default() -> Self {
        Self {
            local: default_local_endpoint(),
            openai: default_openai_endpoint(),
            gemini: default_gemini_endpoint(),
        }
    }
}

/// A single HTTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoint {
    /// Base URL, without the trailing `/chat/completions`
    pub base_url: String,
}

impl Endpoint {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

fn default_local_endpoint() -> Endpoint {
    Endpoint::new("http://localhost:11434/v1")
}
fn default_openai_endpoint() -> Endpoint {
    Endpoint::new("https://api.openai.com/v1")
}
fn default_gemini_endpoint() -> Endpoint {
    Endpoint::new("https://generativelanguage.googleapis.com/v1beta/openai")
}

/// Default model name per provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDefaults {
    #[serde(default = "default_gpt_model")]
    pub gpt: String,
    #[serde(default = "default_gemini_model")]
    pub gemini: String,
    #[serde(default = "default_deepseek_model")]
    pub deepseek: String,
    #[serde(default = "default_llama_model")]
    pub llama: String,
    #[serde(default = "default_qwen_model")]
    pub qwen: String,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            gpt: default_gpt_model(),
            gemini: default_gemini_model(),
            deepseek: default_deepseek_model(),
            llama: default_llama_model(),
            qwen: default_qwen_model(),
        }
    }
}

fn default_gpt_model() -> String {
    "gpt-4o".to_string()
}
fn default_gemini_model() -> String {
    "gemini-2.0-flash-lite".to_string()
}
fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}
fn default_llama_model() -> String {
    "llama3:8b".to_string()
}
fn default_qwen_model() -> String {
    "qwen2.5:14b".to_string()
}

/// Repetition and sampling settings for experiments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentSettings {
    /// Number of full passes over the benchmark
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Sampling temperature for the main generation
    #[serde(default)]
    pub temperature: f64,
    /// HTTP/CLI timeout per model call in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_runs() -> usize {
    5
}
const fn default_timeout_secs() -> u64 {
    120
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde can't express
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [
            ("llm.local", &self.llm.local),
            ("llm.openai", &self.llm.openai),
            ("llm.gemini", &self.llm.gemini),
        ] {
            if endpoint.base_url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name}.base_url is empty")));
            }
        }

        if self.experiment.runs == 0 {
            return Err(ConfigError::Invalid(
                "experiment.runs must be at least 1".to_string(),
            ));
        }

        let temperature = self.experiment.temperature;
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "experiment.temperature must be a non-negative number, got {temperature}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.llm.local.base_url, "http://localhost:11434/v1");
        assert_eq!(config.models.gpt, "gpt-4o");
        assert_eq!(config.models.qwen, "qwen2.5:14b");
        assert_eq!(config.experiment.runs, 5);
        assert!(config.experiment.temperature.abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_serialization_roundtrip() {
        let config = AppConfig::default();
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let parsed = AppConfig::from_yaml(&yaml).expect("deserialize");
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_app_config_from_yaml() {
        let yaml = r#"
llm:
  local:
    base_url: "http://gpu-box:8000/v1"
models:
  llama: "llama3.1:70b"
experiment:
  runs: 3
  temperature: 0.7
"#;
        let config = AppConfig::from_yaml(yaml).expect("parse yaml");
        assert_eq!(config.llm.local.base_url, "http://gpu-box:8000/v1");
        assert_eq!(config.llm.openai.base_url, "https://api.openai.com/v1"); // default
        assert_eq!(config.models.llama, "llama3.1:70b");
        assert_eq!(config.models.deepseek, "deepseek-chat"); // default
        assert_eq!(config.experiment.runs, 3);
        assert!((config.experiment.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.experiment.timeout_secs, 120); // default
    }

    #[test]
    fn test_app_config_empty_yaml_uses_defaults() {
        let config = AppConfig::from_yaml("{}").expect("parse yaml");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_app_config_rejects_zero_runs() {
        let result = AppConfig::from_yaml("experiment:\n  runs: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_app_config_rejects_negative_temperature() {
        let result = AppConfig::from_yaml("experiment:\n  temperature: -0.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_app_config_rejects_empty_base_url() {
        let result = AppConfig::from_yaml("llm:\n  local:\n    base_url: \"\"\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("llm.local"));
    }

    #[test]
    fn test_app_config_invalid_yaml() {
        let result = AppConfig::from_yaml("experiment: [unclosed");
        assert!(matches!(result, Err(ConfigError::YamlError(_))));
    }

    #[test]
    fn test_app_config_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "models:\n  gpt: gpt-4o-mini\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.models.gpt, "gpt-4o-mini");
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config = AppConfig::from_yaml(include_str!("../config.example.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_app_config_load_missing_file() {
        let result = AppConfig::load("/nonexistent/config.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
