//! Experiment execution engine.
//!
//! Runs one baseline over every question of a benchmark, repeated `runs`
//! times, grading each answer and feeding the per-run accuracy and per-question
//! reasoning time into the statistics aggregators.

use crate::baselines::{Baseline, RunOptions};
use crate::benchmark::{answers_match, Benchmark, BenchmarkError};
use crate::llm::LlmError;
use crate::stats::{AccuracyStatistics, AccuracySummary, Efficiency, EfficiencyError};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// Confidence level reported alongside the accuracy mean
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Errors that can occur during an experiment
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Question {item_id} failed: {source}")]
    Llm {
        item_id: String,
        #[source]
        source: LlmError,
    },

    #[error("Efficiency tracking failed: {0}")]
    Efficiency(#[from] EfficiencyError),

    #[error("Benchmark error: {0}")]
    Benchmark(#[from] BenchmarkError),

    #[error("Experiment requires at least one run")]
    NoRuns,
}

/// Outcome of one question in one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionRecord {
    /// 1-based run index
    pub run: usize,
    /// Benchmark item id
    pub id: String,
    /// Reference answer
    pub expected: String,
    /// Baseline's final answer
    pub predicted: String,
    /// Whether the answer was graded correct
    pub correct: bool,
    /// Wall-clock reasoning time in seconds
    pub seconds: f64,
    /// Tokens consumed (input + output)
    pub tokens: u64,
    /// Model calls made
    pub llm_calls: u32,
}

/// Aggregated result of one baseline over one benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Baseline type
    pub baseline: String,
    /// Benchmark name
    pub benchmark: String,
    /// Model identifier
    pub model: String,
    /// Number of completed runs
    pub runs: usize,
    /// Questions per run
    pub num_questions: usize,
    /// Per-run accuracy percentages
    pub accuracy: AccuracyStatistics,
    /// Mean, std and run count of `accuracy`
    pub summary: AccuracySummary,
    /// 95% confidence interval of the mean accuracy
    pub confidence_interval: (f64, f64),
    /// Efficiency `T` in seconds
    pub efficiency_t: f64,
    /// Efficiency `M` (recorded samples)
    pub efficiency_m: usize,
    /// Tokens across every run
    pub total_tokens: u64,
    /// Model calls across every run
    pub total_llm_calls: u64,
    /// `total_tokens` divided by questions answered
    pub mean_tokens_per_question: f64,
    /// Every graded answer
    pub questions: Vec<QuestionRecord>,
}

impl ExperimentResult {
    /// Fraction of graded answers that were correct, across all runs
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn overall_accuracy(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        let correct = self.questions.iter().filter(|q| q.correct).count();
        correct as f64 / self.questions.len() as f64
    }
}

/// Repeats a baseline over a benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentRunner {
    runs: usize,
}

impl Default for ExperimentRunner {
    fn default() -> Self {
        Self::new(5)
    }
}

impl ExperimentRunner {
    /// Create a runner performing `runs` full passes
    #[must_use]
    pub const fn new(runs: usize) -> Self {
        Self { runs }
    }

    /// Configured number of passes
    #[must_use]
    pub const fn runs(&self) -> usize {
        self.runs
    }

    /// Run `baseline` over every item of `benchmark`, `runs` times
    ///
    /// # Errors
    ///
    /// Returns an error if `runs` is zero, the benchmark is empty, or any
    /// model call fails. A failed call aborts the experiment.
    #[allow(clippy::cast_precision_loss)]
    pub fn run(
        &self,
        baseline: &mut dyn Baseline,
        benchmark: &Benchmark,
        options: &RunOptions,
    ) -> Result<ExperimentResult, RunnerError> {
        if self.runs == 0 {
            return Err(RunnerError::NoRuns);
        }
        if benchmark.is_empty() {
            return Err(BenchmarkError::Empty.into());
        }

        let num_questions = benchmark.len();
        let mut accuracy = AccuracyStatistics::new();
        let mut efficiency = Efficiency::new(num_questions)?;
        let mut questions = Vec::with_capacity(num_questions * self.runs);
        let mut total_tokens = 0u64;
        let mut total_llm_calls = 0u64;
        let mut model = String::new();

        tracing::info!(
            baseline = baseline.name(),
            benchmark = %benchmark.name,
            questions = num_questions,
            runs = self.runs,
            "Starting experiment"
        );

        for run in 1..=self.runs {
            let mut task_times = Vec::with_capacity(num_questions);
            let mut correct = 0usize;

            for item in benchmark.iter() {
                let start = Instant::now();
                let response =
                    baseline
                        .run(&item.question, options)
                        .map_err(|source| RunnerError::Llm {
                            item_id: item.id.clone(),
                            source,
                        })?;
                let seconds = start.elapsed().as_secs_f64();

                if model.is_empty() {
                    if let Some(name) = response.metadata().get("model").and_then(|v| v.as_str()) {
                        model = name.to_string();
                    }
                }

                let is_correct = answers_match(response.final_answer(), &item.answer);
                if is_correct {
                    correct += 1;
                }
                total_tokens += response.total_tokens();
                total_llm_calls += u64::from(response.num_llm_calls());
                task_times.push(seconds);

                tracing::debug!(
                    run,
                    id = %item.id,
                    correct = is_correct,
                    seconds,
                    "Graded question"
                );

                questions.push(QuestionRecord {
                    run,
                    id: item.id.clone(),
                    expected: item.answer.clone(),
                    predicted: response.final_answer().to_string(),
                    correct: is_correct,
                    seconds,
                    tokens: response.total_tokens(),
                    llm_calls: response.num_llm_calls(),
                });
            }

            let run_accuracy = correct as f64 / num_questions as f64 * 100.0;
            accuracy.add_result(run_accuracy);
            efficiency.record_sample(&task_times)?;

            tracing::info!(
                run,
                accuracy = run_accuracy,
                correct,
                total = num_questions,
                "Run complete"
            );
        }

        let answered = questions.len();
        Ok(ExperimentResult {
            baseline: baseline.name().to_string(),
            benchmark: benchmark.name.clone(),
            model,
            runs: self.runs,
            num_questions,
            summary: accuracy.summary(),
            confidence_interval: accuracy.confidence_interval(CONFIDENCE_LEVEL),
            accuracy,
            efficiency_t: efficiency.average_total_time(),
            efficiency_m: efficiency.num_samples(),
            total_tokens,
            total_llm_calls,
            mean_tokens_per_question: total_tokens as f64 / answered as f64,
            questions,
        })
    }
}
