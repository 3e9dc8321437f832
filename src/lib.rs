//! # Reasoning Eval
//!
//! Prompt-based reasoning baselines for evaluating language models on
//! question-answering benchmarks.
//!
//! ## Baselines
//!
//! - **ZeroShot**: question in, answer out (one model call)
//! - **ZeroShotCoT**: "Let's think step by step." reasoning followed by a
//!   deterministic answer-extraction call (two model calls)
//! - **ZeroShotCoT-SinglePass**: reasoning and a labelled `Final Answer:` in a
//!   single call
//!
//! Every run returns a [`BaselineResponse`] carrying the answer, the reasoning
//! trace and the token/call counters for that question.
//!
//! ## Architecture
//!
//! ```text
//! Benchmark (JSONL)
//!        ↓
//! Baseline strategy ──→ LanguageModel port (OpenAI-compatible HTTP | CLI)
//!        ↓
//! BaselineResponse (answer, trace, tokens, calls)
//!        ↓
//! ExperimentRunner (M runs × N questions, graded)
//!        ↓
//! AccuracyStatistics (mean, std, 95% CI) + Efficiency (T, M)
//!        ↓
//! ExperimentReport (text | markdown | JSON, Welch comparisons)
//! ```

pub mod baselines;
pub mod benchmark;
pub mod config;
pub mod llm;
pub mod providers;
pub mod report;
pub mod runner;
pub mod stats;

pub use baselines::{
    extract_answer_simple, Baseline, BaselineExecutor, BaselineKind, BaselineResponse, Metadata,
    RunOptions, UnknownBaseline, ZeroShot, ZeroShotCoT, ZeroShotCoTSinglePass,
};
pub use benchmark::{answers_match, Benchmark, BenchmarkError, BenchmarkItem};
pub use config::{AppConfig, ConfigError, Endpoint, ExperimentSettings, LlmEndpoints, ModelDefaults};
pub use llm::{LanguageModel, LlmError, LlmResponse};
pub use providers::{build_model, CliModel, CliToolConfig, ModelProvider, OpenAiCompatClient};
pub use report::{BaselineComparison, BaselineSummary, ExperimentReport, ReportMetadata};
pub use runner::{ExperimentResult, ExperimentRunner, QuestionRecord, RunnerError};
pub use stats::{
    bonferroni_correction, welch_t_test, AccuracyStatistics, AccuracySummary, Efficiency,
    EfficiencyError, SignificanceResult,
};
