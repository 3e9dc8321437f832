//! Report generation for experiment results.
//!
//! Collects one [`ExperimentResult`] per baseline and renders:
//! - Per-baseline accuracy (mean ± std, 95% CI), efficiency and token usage
//! - Pairwise Welch's t-tests on run accuracies, Bonferroni-corrected

use crate::runner::{ExperimentResult, CONFIDENCE_LEVEL};
use crate::stats::{bonferroni_correction, welch_t_test, SignificanceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use tabled::{Table, Tabled};

/// Default family-wise significance threshold
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Full experiment report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// One summary row per baseline, in input order
    pub baselines: Vec<BaselineSummary>,
    /// Pairwise accuracy comparisons
    pub comparisons: Vec<BaselineComparison>,
    /// Raw results including every graded answer
    pub results: Vec<ExperimentResult>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report title
    pub title: String,
    /// Model under evaluation
    pub model: String,
    /// Benchmarks covered
    pub benchmarks: Vec<String>,
    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Framework version
    pub framework_version: String,
    /// Family-wise significance threshold
    pub alpha: f64,
    /// Per-comparison threshold after Bonferroni correction
    pub corrected_alpha: f64,
}

/// Headline numbers for one baseline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineSummary {
    /// Baseline type
    pub baseline: String,
    /// Benchmark name
    pub benchmark: String,
    /// Completed runs
    pub runs: usize,
    /// Mean accuracy (%)
    pub mean_accuracy: f64,
    /// Sample standard deviation of accuracy (%)
    pub std_accuracy: f64,
    /// Lower bound of the 95% CI (%)
    pub ci_lower: f64,
    /// Upper bound of the 95% CI (%)
    pub ci_upper: f64,
    /// Efficiency `T` in seconds
    pub efficiency_t: f64,
    /// Tokens across all runs
    pub total_tokens: u64,
    /// Mean tokens per answered question
    pub mean_tokens_per_question: f64,
}

impl From<&ExperimentResult> for BaselineSummary {
    fn from(result: &ExperimentResult) -> Self {
        Self {
            baseline: result.baseline.clone(),
            benchmark: result.benchmark.clone(),
            runs: result.runs,
            mean_accuracy: result.summary.mean,
            std_accuracy: result.summary.std,
            ci_lower: result.confidence_interval.0,
            ci_upper: result.confidence_interval.1,
            efficiency_t: result.efficiency_t,
            total_tokens: result.total_tokens,
            mean_tokens_per_question: result.mean_tokens_per_question,
        }
    }
}

/// Statistical comparison between two baselines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineComparison {
    /// First baseline
    pub baseline_a: String,
    /// Second baseline
    pub baseline_b: String,
    /// Welch's t-test on per-run accuracy
    pub significance: SignificanceResult,
}

impl ExperimentReport {
    /// Build a report with the default significance threshold
    #[must_use]
    pub fn new(model: &str, results: Vec<ExperimentResult>) -> Self {
        Self::with_alpha(model, results, DEFAULT_ALPHA)
    }

    /// Build a report with a custom family-wise threshold
    #[must_use]
    pub fn with_alpha(model: &str, results: Vec<ExperimentResult>, alpha: f64) -> Self {
        let num_pairs = results.len() * results.len().saturating_sub(1) / 2;
        let corrected_alpha = bonferroni_correction(alpha, num_pairs);

        let mut benchmarks: Vec<String> = Vec::new();
        for result in &results {
            if !benchmarks.contains(&result.benchmark) {
                benchmarks.push(result.benchmark.clone());
            }
        }

        let baselines = results.iter().map(BaselineSummary::from).collect();
        let comparisons = build_comparisons(&results, corrected_alpha);

        Self {
            metadata: ReportMetadata {
                title: format!("Reasoning Baseline Report: {model}"),
                model: model.to_string(),
                benchmarks,
                generated_at: Utc::now(),
                framework_version: env!("CARGO_PKG_VERSION").to_string(),
                alpha,
                corrected_alpha,
            },
            baselines,
            comparisons,
            results,
        }
    }

    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render report as markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        writeln!(output, "# {}", self.metadata.title).ok();
        writeln!(output).ok();
        writeln!(
            output,
            "**Generated:** {}",
            self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .ok();
        writeln!(
            output,
            "**Benchmarks:** {}",
            self.metadata.benchmarks.join(", ")
        )
        .ok();
        writeln!(
            output,
            "**Framework Version:** {}",
            self.metadata.framework_version
        )
        .ok();
        writeln!(output).ok();

        writeln!(output, "## Baselines").ok();
        writeln!(output).ok();
        let table = Table::new(self.baselines.iter().map(SummaryTableRow::from)).to_string();
        writeln!(output, "{table}").ok();
        writeln!(output).ok();

        if !self.comparisons.is_empty() {
            writeln!(output, "## Statistical Comparisons").ok();
            writeln!(output).ok();
            writeln!(
                output,
                "| Comparison | t-stat | p-value | Effect Size | Significant |"
            )
            .ok();
            writeln!(
                output,
                "|------------|--------|---------|-------------|-------------|"
            )
            .ok();
            for comparison in &self.comparisons {
                let sig = &comparison.significance;
                writeln!(
                    output,
                    "| {} vs {} | {:.3} | {:.4} | {} ({:.2}) | {} |",
                    comparison.baseline_a,
                    comparison.baseline_b,
                    sig.t_statistic,
                    sig.p_value,
                    sig.effect_interpretation,
                    sig.cohens_d,
                    if sig.is_significant { "Yes" } else { "No" }
                )
                .ok();
            }
            writeln!(output).ok();
        }

        writeln!(output, "## Configuration").ok();
        writeln!(output).ok();
        writeln!(
            output,
            "- Confidence level: {}%",
            CONFIDENCE_LEVEL * 100.0
        )
        .ok();
        writeln!(
            output,
            "- Significance threshold (α): {} (Bonferroni-corrected: {:.4})",
            self.metadata.alpha, self.metadata.corrected_alpha
        )
        .ok();

        output
    }

    /// Render the console summary
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        writeln!(
            output,
            "═══════════════════════════════════════════════════════════════"
        )
        .ok();
        writeln!(output, "  {}", self.metadata.title).ok();
        writeln!(
            output,
            "═══════════════════════════════════════════════════════════════"
        )
        .ok();

        for summary in &self.baselines {
            writeln!(output).ok();
            writeln!(output, "{} on {}", summary.baseline, summary.benchmark).ok();
            writeln!(
                output,
                "───────────────────────────────────────────────────────────────"
            )
            .ok();
            writeln!(output, "  Runs:             {}", summary.runs).ok();
            writeln!(
                output,
                "  Mean Accuracy:    {:.2}% ± {:.2}%",
                summary.mean_accuracy, summary.std_accuracy
            )
            .ok();
            writeln!(
                output,
                "  95% CI:           [{:.2}%, {:.2}%]",
                summary.ci_lower, summary.ci_upper
            )
            .ok();
            writeln!(output, "  Efficiency (T):   {:.3}s", summary.efficiency_t).ok();
            writeln!(
                output,
                "  Tokens:           {} ({:.1}/question)",
                summary.total_tokens, summary.mean_tokens_per_question
            )
            .ok();
        }

        if !self.comparisons.is_empty() {
            writeln!(output).ok();
            writeln!(output, "SIGNIFICANCE (α = {:.4})", self.metadata.corrected_alpha).ok();
            writeln!(
                output,
                "───────────────────────────────────────────────────────────────"
            )
            .ok();
            for comparison in &self.comparisons {
                writeln!(
                    output,
                    "  {} vs {}: p = {:.4}{}",
                    comparison.baseline_a,
                    comparison.baseline_b,
                    comparison.significance.p_value,
                    if comparison.significance.is_significant {
                        " *"
                    } else {
                        ""
                    }
                )
                .ok();
            }
        }

        output
    }

    /// Print the console summary to stdout
    pub fn print_summary(&self) {
        print!("{}", self.to_text());
    }
}

fn build_comparisons(results: &[ExperimentResult], alpha: f64) -> Vec<BaselineComparison> {
    let mut comparisons = Vec::new();

    for (i, a) in results.iter().enumerate() {
        for b in &results[i + 1..] {
            if let Some(significance) = welch_t_test(&a.accuracy, &b.accuracy, alpha) {
                comparisons.push(BaselineComparison {
                    baseline_a: a.baseline.clone(),
                    baseline_b: b.baseline.clone(),
                    significance,
                });
            }
        }
    }

    comparisons
}

/// Table row for markdown output
#[derive(Tabled)]
struct SummaryTableRow {
    #[tabled(rename = "Baseline")]
    baseline: String,
    #[tabled(rename = "Runs")]
    runs: usize,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "95% CI")]
    ci: String,
    #[tabled(rename = "T (s)")]
    efficiency: String,
    #[tabled(rename = "Tokens/Q")]
    tokens: String,
}

impl From<&BaselineSummary> for SummaryTableRow {
    fn from(summary: &BaselineSummary) -> Self {
        Self {
            baseline: summary.baseline.clone(),
            runs: summary.runs,
            accuracy: format!(
                "{:.2}% ± {:.2}",
                summary.mean_accuracy, summary.std_accuracy
            ),
            ci: format!("[{:.2}, {:.2}]", summary.ci_lower, summary.ci_upper),
            efficiency: format!("{:.3}", summary.efficiency_t),
            tokens: format!("{:.1}", summary.mean_tokens_per_question),
        }
    }
}
