//! Prompt engineering baselines.
//!
//! A baseline turns a prompting strategy into a fixed sequence of model calls:
//!
//! ```text
//! run(question)
//!    ↓ reset_counters()
//! prompt assembly
//!    ↓ call_llm() × k     (only place tokens are counted)
//! answer parsing
//!    ↓ create_response()
//! BaselineResponse
//! ```
//!
//! Strategies own a [`BaselineExecutor`] which holds the shared counters and the
//! model port. Callers only need [`Baseline::run`].

pub mod cot;
pub mod zero_shot;

pub use cot::{extract_answer_simple, ZeroShotCoT, ZeroShotCoTSinglePass};
pub use zero_shot::ZeroShot;

use crate::llm::{LanguageModel, LlmError, LlmResponse};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Free-form per-strategy metadata attached to a response
pub type Metadata = HashMap<String, serde_json::Value>;

/// Standardized result of one baseline run.
///
/// Built only by [`BaselineExecutor::create_response`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineResponse {
    final_answer: String,
    reasoning_trace: String,
    total_input_tokens: u64,
    total_output_tokens: u64,
    num_llm_calls: u32,
    baseline_type: String,
    intermediate_steps: Vec<String>,
    metadata: Metadata,
}

impl BaselineResponse {
    /// The answer produced by the strategy
    #[must_use]
    pub fn final_answer(&self) -> &str {
        &self.final_answer
    }

    /// Full reasoning text, empty when the strategy requests none
    #[must_use]
    pub fn reasoning_trace(&self) -> &str {
        &self.reasoning_trace
    }

    /// Input tokens across all model calls of the run
    #[must_use]
    pub const fn total_input_tokens(&self) -> u64 {
        self.total_input_tokens
    }

    /// Output tokens across all model calls of the run
    #[must_use]
    pub const fn total_output_tokens(&self) -> u64 {
        self.total_output_tokens
    }

    /// Input plus output tokens
    #[must_use]
    pub const fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }

    /// Number of model calls made during the run
    #[must_use]
    pub const fn num_llm_calls(&self) -> u32 {
        self.num_llm_calls
    }

    /// Identifier of the strategy that produced this response
    #[must_use]
    pub fn baseline_type(&self) -> &str {
        &self.baseline_type
    }

    /// Ordered intermediate outputs
    #[must_use]
    pub fn intermediate_steps(&self) -> &[String] {
        &self.intermediate_steps
    }

    /// Strategy-specific metadata
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl Serialize for BaselineResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BaselineResponse", 9)?;
        state.serialize_field("final_answer", &self.final_answer)?;
        state.serialize_field("reasoning_trace", &self.reasoning_trace)?;
        state.serialize_field("total_input_tokens", &self.total_input_tokens)?;
        state.serialize_field("total_output_tokens", &self.total_output_tokens)?;
        state.serialize_field("total_tokens", &self.total_tokens())?;
        state.serialize_field("num_llm_calls", &self.num_llm_calls)?;
        state.serialize_field("baseline_type", &self.baseline_type)?;
        state.serialize_field("intermediate_steps", &self.intermediate_steps)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.end()
    }
}

/// Options accepted by every [`Baseline::run`]; strategies ignore what they don't use
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// System-level instruction placed first in the prompt
    pub system_prompt: Option<String>,
    /// Task-specific instruction placed before the question
    pub instruction: Option<String>,
    /// Sampling temperature for the main generation
    pub temperature: f64,
    /// Run the answer-extraction stage (two-stage CoT only)
    pub extract_answer: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            system_prompt: None,
            instruction: None,
            temperature: 0.0,
            extract_answer: true,
        }
    }
}

impl RunOptions {
    /// Set the system prompt
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Set the task instruction
    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Toggle the answer-extraction stage
    #[must_use]
    pub const fn with_extract_answer(mut self, extract_answer: bool) -> Self {
        self.extract_answer = extract_answer;
        self
    }

    /// Join the optional preamble and `sections` with blank lines
    pub(crate) fn assemble_prompt(&self, sections: &[&str]) -> String {
        let preamble = [self.system_prompt.as_deref(), self.instruction.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty());

        preamble
            .chain(sections.iter().copied())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Shared machinery for every strategy: token/call counters, the single
/// accounting call wrapper, and the response builder.
pub struct BaselineExecutor {
    llm: Arc<dyn LanguageModel>,
    baseline_type: String,
    total_input_tokens: u64,
    total_output_tokens: u64,
    num_llm_calls: u32,
}

impl BaselineExecutor {
    /// Bind a strategy name to a model port
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>, baseline_type: impl Into<String>) -> Self {
        Self {
            llm,
            baseline_type: baseline_type.into(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            num_llm_calls: 0,
        }
    }

    /// Zero all counters; every `run` starts here
    pub fn reset_counters(&mut self) {
        self.total_input_tokens = 0;
        self.total_output_tokens = 0;
        self.num_llm_calls = 0;
    }

    /// Call the model once and account for its token usage
    ///
    /// # Errors
    ///
    /// Propagates the port error unchanged; counters are left untouched.
    pub fn call_llm(&mut self, prompt: &str, temperature: f64) -> Result<LlmResponse, LlmError> {
        let response = self.llm.generate(prompt, temperature)?;

        self.total_input_tokens += response.input_tokens;
        self.total_output_tokens += response.output_tokens;
        self.num_llm_calls += 1;

        tracing::debug!(
            baseline = %self.baseline_type,
            call = self.num_llm_calls,
            prompt_chars = prompt.len(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "LLM call completed"
        );

        Ok(response)
    }

    /// Snapshot the current counters into a response
    #[must_use]
    pub fn create_response(
        &self,
        final_answer: impl Into<String>,
        reasoning_trace: impl Into<String>,
        intermediate_steps: Vec<String>,
        metadata: Metadata,
    ) -> BaselineResponse {
        BaselineResponse {
            final_answer: final_answer.into(),
            reasoning_trace: reasoning_trace.into(),
            total_input_tokens: self.total_input_tokens,
            total_output_tokens: self.total_output_tokens,
            num_llm_calls: self.num_llm_calls,
            baseline_type: self.baseline_type.clone(),
            intermediate_steps,
            metadata,
        }
    }

    /// Strategy identifier stamped on responses
    #[must_use]
    pub fn baseline_type(&self) -> &str {
        &self.baseline_type
    }

    /// The bound model port
    #[must_use]
    pub fn llm(&self) -> &dyn LanguageModel {
        self.llm.as_ref()
    }

    /// Input tokens since the last reset
    #[must_use]
    pub const fn total_input_tokens(&self) -> u64 {
        self.total_input_tokens
    }

    /// Output tokens since the last reset
    #[must_use]
    pub const fn total_output_tokens(&self) -> u64 {
        self.total_output_tokens
    }

    /// Model calls since the last reset
    #[must_use]
    pub const fn num_llm_calls(&self) -> u32 {
        self.num_llm_calls
    }
}

impl fmt::Debug for BaselineExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaselineExecutor")
            .field("baseline_type", &self.baseline_type)
            .field("llm", &self.llm.model_name())
            .field("total_input_tokens", &self.total_input_tokens)
            .field("total_output_tokens", &self.total_output_tokens)
            .field("num_llm_calls", &self.num_llm_calls)
            .finish()
    }
}

/// A prompting strategy.
///
/// `run` takes `&mut self`: counters are per-instance, so one executor
/// serves one logical run at a time.
pub trait Baseline {
    /// Strategy identifier (e.g. `ZeroShotCoT`)
    fn name(&self) -> &str;

    /// Execute the strategy on one question
    ///
    /// # Errors
    ///
    /// Any port failure aborts the run; no partial response is produced.
    fn run(&mut self, question: &str, options: &RunOptions) -> Result<BaselineResponse, LlmError>;
}

/// Unknown baseline identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown baseline: {0} (expected one of: zero-shot, zero-shot-cot, zero-shot-cot-single-pass)")]
pub struct UnknownBaseline(pub String);

/// The strategies this crate ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaselineKind {
    /// Direct question/answer prompting
    ZeroShot,
    /// Two-stage reasoning + extraction
    ZeroShotCoT,
    /// Reasoning and labelled answer in one call
    ZeroShotCoTSinglePass,
}

impl BaselineKind {
    /// All available strategies
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::ZeroShot, Self::ZeroShotCoT, Self::ZeroShotCoTSinglePass]
    }

    /// Identifier stamped on responses
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZeroShot => zero_shot::BASELINE_NAME,
            Self::ZeroShotCoT => cot::BASELINE_NAME,
            Self::ZeroShotCoTSinglePass => cot::SINGLE_PASS_BASELINE_NAME,
        }
    }

    /// One-line description for listings
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ZeroShot => "Direct prompting: question in, answer out (1 call)",
            Self::ZeroShotCoT => {
                "\"Let's think step by step\" reasoning, then deterministic extraction (2 calls)"
            }
            Self::ZeroShotCoTSinglePass => {
                "Step-by-step reasoning with a labelled final answer (1 call)"
            }
        }
    }

    /// Construct the strategy bound to `llm`
    #[must_use]
    pub fn build(self, llm: Arc<dyn LanguageModel>) -> Box<dyn Baseline> {
        match self {
            Self::ZeroShot => Box::new(ZeroShot::new(llm)),
            Self::ZeroShotCoT => Box::new(ZeroShotCoT::new(llm)),
            Self::ZeroShotCoTSinglePass => Box::new(ZeroShotCoTSinglePass::new(llm)),
        }
    }
}

impl fmt::Display for BaselineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BaselineKind {
    type Err = UnknownBaseline;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        match key.as_str() {
            "zeroshot" | "io" | "input" | "standard" => Ok(Self::ZeroShot),
            "zeroshotcot" | "zerocot" | "cot" => Ok(Self::ZeroShotCoT),
            "zeroshotcotsinglepass" | "zerocotsinglepass" | "cotsinglepass" | "singlepass" => {
                Ok(Self::ZeroShotCoTSinglePass)
            }
            _ => Err(UnknownBaseline(s.to_string())),
        }
    }
}
