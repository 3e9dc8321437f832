//! CLI-backed model port.
//!
//! OFFLINE-FIRST: shells out to an installed LLM CLI (`claude`, `gemini`)
//! instead of calling an HTTP API. The CLIs report no usage, so token counts
//! are estimated from text length and temperature is not forwarded.

use crate::llm::{LanguageModel, LlmError, LlmResponse};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often a running CLI is checked for exit
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How to invoke a CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliToolConfig {
    /// Tool name used as the model identifier
    pub name: String,
    /// Executable to invoke
    pub command: String,
    /// Arguments template, split with shell quoting rules; `{prompt}` inside
    /// any argument is replaced by the raw prompt
    pub args_template: String,
}

impl CliToolConfig {
    /// Claude CLI in print mode
    #[must_use]
    pub fn claude() -> Self {
        Self {
            name: "claude".to_string(),
            command: "claude".to_string(),
            args_template: "--print \"{prompt}\"".to_string(),
        }
    }

    /// Gemini CLI
    #[must_use]
    pub fn gemini() -> Self {
        Self {
            name: "gemini".to_string(),
            command: "gemini".to_string(),
            args_template: "\"{prompt}\"".to_string(),
        }
    }
}

/// Language model backed by a local CLI tool
#[derive(Debug, Clone)]
pub struct CliModel {
    config: CliToolConfig,
    timeout: Duration,
}

impl CliModel {
    /// Claude CLI port
    #[must_use]
    pub fn claude(timeout: Duration) -> Self {
        Self::with_config(CliToolConfig::claude(), timeout)
    }

    /// Gemini CLI port
    #[must_use]
    pub fn gemini(timeout: Duration) -> Self {
        Self::with_config(CliToolConfig::gemini(), timeout)
    }

    /// Port with custom configuration
    #[must_use]
    pub const fn with_config(config: CliToolConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// Check if the CLI tool is available
    #[must_use]
    pub fn is_available(&self) -> bool {
        Command::new("which")
            .arg(&self.config.command)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    /// Return `self` if the tool is installed
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] when the command cannot be found.
    pub fn checked(self) -> Result<Self, LlmError> {
        if self.is_available() {
            Ok(self)
        } else {
            Err(tool_not_found(&self.config.command))
        }
    }

    /// Get the tool name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Timeout applied to each invocation; the child is killed when exceeded
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_command(&self, prompt: &str) -> Result<Command, LlmError> {
        let args = shell_words::split(&self.config.args_template).map_err(|e| {
            LlmError::Config(format!(
                "Invalid argument template for {}: {e}",
                self.config.name
            ))
        })?;

        #[allow(clippy::literal_string_with_formatting_args)]
        let args = args.iter().map(|arg| arg.replace("{prompt}", prompt));

        let mut cmd = Command::new(&self.config.command);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(cmd)
    }
}

impl LanguageModel for CliModel {
    fn model_name(&self) -> &str {
        &self.config.name
    }

    fn generate(&self, prompt: &str, temperature: f64) -> Result<LlmResponse, LlmError> {
        tracing::debug!(
            tool = %self.config.name,
            temperature,
            "Invoking CLI model (temperature not forwarded)"
        );

        let start = Instant::now();
        let mut child = self.build_command(prompt)?.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                tool_not_found(&self.config.command)
            } else {
                LlmError::provider(&self.config.name, e)
            }
        })?;

        // Both pipes drain while the child runs so neither can fill up
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if start.elapsed() >= self.timeout => {
                    child.kill().ok();
                    child.wait().ok();
                    tracing::warn!(
                        tool = %self.config.name,
                        timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                        "CLI model timed out, killed"
                    );
                    return Err(LlmError::provider(
                        &self.config.name,
                        format!("CLI timeout after {:?}", self.timeout),
                    ));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(LlmError::provider(&self.config.name, e)),
            }
        };
        let latency = start.elapsed();

        let stdout = collect(stdout).map_err(|e| LlmError::provider(&self.config.name, e))?;
        let stderr = collect(stderr).unwrap_or_default();

        if !status.success() {
            return Err(LlmError::provider(
                &self.config.name,
                format!("CLI exited with {status}: {}", stderr.trim()),
            ));
        }

        let content = stdout.trim_end().to_string();
        Ok(LlmResponse {
            input_tokens: estimate_tokens(prompt),
            output_tokens: estimate_tokens(&content),
            model_name: self.config.name.clone(),
            raw: serde_json::json!({
                "command": self.config.command,
                "latency_ms": u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            }),
            content,
        })
    }
}

fn tool_not_found(command: &str) -> LlmError {
    LlmError::Config(format!("CLI tool not found: {command}"))
}

type PipeReader = JoinHandle<std::io::Result<Vec<u8>>>;

/// Read a child pipe to EOF on its own thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<PipeReader> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).map(|_| buf)
        })
    })
}

fn collect(handle: Option<PipeReader>) -> std::io::Result<String> {
    let bytes = match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| std::io::Error::other("pipe reader panicked"))??,
        None => Vec::new(),
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Rough token estimation (4 chars per token average)
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn estimate_tokens(text: &str) -> u64 {
    (text.len() as f64 / 4.0).ceil() as u64
}
