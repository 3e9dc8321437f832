//! Statistics aggregation across repeated runs.
//!
//! - [`AccuracyStatistics`]: per-run accuracy percentages → mean, sample std,
//!   Student's t confidence interval
//! - [`Efficiency`]: reasoning-time matrix (M samples × N tasks) →
//!   `T = (1/N) · Σᵢ Σⱼ Tᵢⱼ`
//! - [`welch_t_test`]: significance of the accuracy gap between two baselines
//!
//! Both aggregators are single-writer; callers synchronize externally.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

/// Errors raised when recording efficiency samples
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EfficiencyError {
    #[error("Efficiency requires at least one task")]
    NoTasks,

    #[error("task_times must have length {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("task_times must be non-negative: index {index} is {value}")]
    NegativeTime { index: usize, value: f64 },
}

/// Mean, sample standard deviation and run count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    /// Mean accuracy (%)
    pub mean: f64,
    /// Sample standard deviation (%)
    pub std: f64,
    /// Number of runs aggregated
    pub num_runs: usize,
}

/// Running distribution of per-run accuracy percentages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyStatistics {
    accuracy_list: Vec<f64>,
}

impl AccuracyStatistics {
    /// Create an empty aggregator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one run's accuracy (0-100); not range-checked
    pub fn add_result(&mut self, accuracy: f64) {
        self.accuracy_list.push(accuracy);
    }

    /// Arithmetic mean, 0.0 without samples
    #[must_use]
    pub fn mean(&self) -> f64 {
        compute_mean(&self.accuracy_list)
    }

    /// Sample standard deviation (divisor n-1), 0.0 below two samples
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        compute_std(&self.accuracy_list)
    }

    /// Number of recorded runs
    #[must_use]
    pub fn num_runs(&self) -> usize {
        self.accuracy_list.len()
    }

    /// Recorded accuracies in insertion order
    #[must_use]
    pub fn results(&self) -> &[f64] {
        &self.accuracy_list
    }

    /// Drop all samples
    pub fn reset(&mut self) {
        self.accuracy_list.clear();
    }

    /// `(mean, std, num_runs)`
    #[must_use]
    pub fn summary(&self) -> AccuracySummary {
        AccuracySummary {
            mean: self.mean(),
            std: self.std_dev(),
            num_runs: self.num_runs(),
        }
    }

    /// Two-sided Student's t confidence interval around the mean.
    ///
    /// Collapses to `(mean, mean)` with fewer than two samples or no variance.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn confidence_interval(&self, confidence: f64) -> (f64, f64) {
        let mean = self.mean();
        let std = self.std_dev();
        let n = self.accuracy_list.len();

        if n < 2 || std < f64::EPSILON || !(0.0..1.0).contains(&confidence) {
            return (mean, mean);
        }

        let Ok(t_dist) = StudentsT::new(0.0, 1.0, (n - 1) as f64) else {
            return (mean, mean);
        };

        let t_crit = t_dist.inverse_cdf(0.5 + confidence / 2.0);
        let half_width = t_crit * std / (n as f64).sqrt();
        (mean - half_width, mean + half_width)
    }
}

/// Reasoning-efficiency tracker.
///
/// Each sample is one row of `num_tasks` non-negative timings. The reported
/// `T` divides the grand total by N only:
///
/// ```text
/// T = (1/N) * Σ_{i=1..M} Σ_{j=1..N} T_ij
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Efficiency {
    num_tasks: usize,
    samples: Vec<Vec<f64>>,
}

impl Efficiency {
    /// Create a tracker for `num_tasks` tasks
    ///
    /// # Errors
    ///
    /// Returns [`EfficiencyError::NoTasks`] when `num_tasks` is zero.
    pub fn new(num_tasks: usize) -> Result<Self, EfficiencyError> {
        if num_tasks == 0 {
            return Err(EfficiencyError::NoTasks);
        }
        Ok(Self {
            num_tasks,
            samples: Vec::new(),
        })
    }

    /// Record one sample: `task_times[j]` is the time spent on task `j`
    ///
    /// # Errors
    ///
    /// Rejects rows of the wrong length or containing a value that is not
    /// `>= 0` (NaN included). Nothing is stored on error.
    pub fn record_sample(&mut self, task_times: &[f64]) -> Result<(), EfficiencyError> {
        if task_times.len() != self.num_tasks {
            return Err(EfficiencyError::WrongLength {
                expected: self.num_tasks,
                actual: task_times.len(),
            });
        }

        if let Some((index, &value)) = task_times
            .iter()
            .enumerate()
            .find(|&(_, &value)| value.is_nan() || value < 0.0)
        {
            return Err(EfficiencyError::NegativeTime { index, value });
        }

        self.samples.push(task_times.to_vec());
        Ok(())
    }

    /// `T`: grand total of all recorded timings divided by N
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_total_time(&self) -> f64 {
        let total: f64 = self.samples.iter().flatten().sum();
        total / self.num_tasks as f64
    }

    /// `M`: number of recorded samples
    #[must_use]
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// `N`: tasks per sample
    #[must_use]
    pub const fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    /// Drop all samples
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

/// Compute mean of samples
#[allow(clippy::cast_precision_loss)]
fn compute_mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Compute sample standard deviation
#[allow(clippy::cast_precision_loss)]
fn compute_std(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let mean = compute_mean(samples);
    let variance =
        samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;
    variance.sqrt()
}

/// Result of a significance test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificanceResult {
    /// t-statistic
    pub t_statistic: f64,
    /// Two-tailed p-value
    pub p_value: f64,
    /// Degrees of freedom
    pub degrees_of_freedom: f64,
    /// Is result significant at the given alpha?
    pub is_significant: bool,
    /// Cohen's d effect size
    pub cohens_d: f64,
    /// Effect size interpretation
    pub effect_interpretation: String,
}

/// Welch's t-test between two accuracy distributions
///
/// Returns `None` if either side has fewer than two runs or neither has variance.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::suboptimal_flops)]
pub fn welch_t_test(
    a: &AccuracyStatistics,
    b: &AccuracyStatistics,
    alpha: f64,
) -> Option<SignificanceResult> {
    let (samples_a, samples_b) = (a.results(), b.results());
    if samples_a.len() < 2 || samples_b.len() < 2 {
        return None;
    }

    let n_a = samples_a.len() as f64;
    let n_b = samples_b.len() as f64;
    let mean_a = compute_mean(samples_a);
    let mean_b = compute_mean(samples_b);
    let var_a = compute_std(samples_a).powi(2);
    let var_b = compute_std(samples_b).powi(2);

    if var_a < f64::EPSILON && var_b < f64::EPSILON {
        return None;
    }

    let se = ((var_a / n_a) + (var_b / n_b)).sqrt();
    let t_statistic = (mean_a - mean_b) / se;

    // Welch-Satterthwaite degrees of freedom
    let df_num = ((var_a / n_a) + (var_b / n_b)).powi(2);
    let df_denom = ((var_a / n_a).powi(2) / (n_a - 1.0)) + ((var_b / n_b).powi(2) / (n_b - 1.0));
    let df = if df_denom > f64::EPSILON {
        df_num / df_denom
    } else {
        (n_a + n_b - 2.0).max(1.0)
    };

    let t_dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = 2.0 * (1.0 - t_dist.cdf(t_statistic.abs()));

    let pooled_std = (((n_a - 1.0) * var_a + (n_b - 1.0) * var_b) / (n_a + n_b - 2.0)).sqrt();
    let cohens_d = if pooled_std > f64::EPSILON {
        (mean_a - mean_b) / pooled_std
    } else {
        0.0
    };

    Some(SignificanceResult {
        t_statistic,
        p_value,
        degrees_of_freedom: df,
        is_significant: p_value < alpha,
        cohens_d,
        effect_interpretation: interpret_cohens_d(cohens_d),
    })
}

/// Apply Bonferroni correction for multiple comparisons
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bonferroni_correction(alpha: f64, num_comparisons: usize) -> f64 {
    if num_comparisons == 0 {
        return alpha;
    }
    alpha / num_comparisons as f64
}

/// Interpret Cohen's d effect size
fn interpret_cohens_d(d: f64) -> String {
    let abs_d = d.abs();
    if abs_d < 0.2 {
        "negligible".to_string()
    } else if abs_d < 0.5 {
        "small".to_string()
    } else if abs_d < 0.8 {
        "medium".to_string()
    } else {
        "large".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stats(values: &[f64]) -> AccuracyStatistics {
        let mut stats = AccuracyStatistics::new();
        for &v in values {
            stats.add_result(v);
        }
        stats
    }

    // =========================================================================
    // AccuracyStatistics
    // =========================================================================

    #[test]
    fn test_accuracy_empty() {
        let stats = AccuracyStatistics::new();
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.std_dev(), 0.0);
        assert_eq!(stats.num_runs(), 0);
    }

    #[test]
    fn test_accuracy_single_sample_has_zero_std() {
        let stats = stats(&[80.0]);
        assert_eq!(stats.mean(), 80.0);
        assert_eq!(stats.std_dev(), 0.0);
        assert_eq!(stats.num_runs(), 1);
    }

    #[test]
    fn test_accuracy_two_samples() {
        let stats = stats(&[80.0, 90.0]);
        assert!((stats.mean() - 85.0).abs() < 1e-12);
        // sample std: sqrt(((80-85)^2 + (90-85)^2) / 1) = sqrt(50)
        assert!((stats.std_dev() - 50.0_f64.sqrt()).abs() < 1e-12);
        assert!((stats.std_dev() - 7.07).abs() < 0.01);
    }

    #[test]
    fn test_accuracy_summary_and_reset() {
        let mut stats = stats(&[70.0, 80.0, 90.0]);
        let summary = stats.summary();
        assert!((summary.mean - 80.0).abs() < 1e-12);
        assert!((summary.std - 10.0).abs() < 1e-12);
        assert_eq!(summary.num_runs, 3);

        stats.reset();
        assert_eq!(stats.num_runs(), 0);
        assert_eq!(stats.summary().mean, 0.0);
    }

    #[test]
    fn test_accuracy_no_range_validation() {
        let stats = stats(&[150.0, -10.0]);
        assert_eq!(stats.num_runs(), 2);
        assert!((stats.mean() - 70.0).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_interval_degenerate() {
        assert_eq!(stats(&[]).confidence_interval(0.95), (0.0, 0.0));
        assert_eq!(stats(&[75.0]).confidence_interval(0.95), (75.0, 75.0));
        assert_eq!(stats(&[60.0, 60.0]).confidence_interval(0.95), (60.0, 60.0));
    }

    #[test]
    fn test_confidence_interval_brackets_mean() {
        let stats = stats(&[80.0, 82.0, 85.0, 79.0, 84.0]);
        let (lower, upper) = stats.confidence_interval(0.95);
        let mean = stats.mean();
        assert!(lower < mean && mean < upper);
        assert!(((mean - lower) - (upper - mean)).abs() < 1e-9);

        let (lower_90, upper_90) = stats.confidence_interval(0.90);
        assert!(upper_90 - lower_90 < upper - lower);
    }

    #[test]
    fn test_confidence_interval_two_samples_uses_t() {
        // t(0.975, df=1) ≈ 12.706
        let stats = stats(&[80.0, 90.0]);
        let (lower, upper) = stats.confidence_interval(0.95);
        let half = (upper - lower) / 2.0;
        assert!((half - 12.706 * 5.0).abs() < 0.01);
    }

    // =========================================================================
    // Efficiency
    // =========================================================================

    #[test]
    fn test_efficiency_rejects_zero_tasks() {
        assert_eq!(Efficiency::new(0).unwrap_err(), EfficiencyError::NoTasks);
    }

    #[test]
    fn test_efficiency_rejects_wrong_length() {
        let mut eff = Efficiency::new(2).unwrap();
        let err = eff.record_sample(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            EfficiencyError::WrongLength {
                expected: 2,
                actual: 3
            }
        );
        assert_eq!(eff.num_samples(), 0);
    }

    #[test]
    fn test_efficiency_rejects_negative() {
        let mut eff = Efficiency::new(2).unwrap();
        let err = eff.record_sample(&[1.0, -0.5]).unwrap_err();
        assert!(matches!(err, EfficiencyError::NegativeTime { index: 1, .. }));
        assert_eq!(eff.num_samples(), 0);
    }

    #[test]
    fn test_efficiency_rejects_nan() {
        let mut eff = Efficiency::new(1).unwrap();
        assert!(eff.record_sample(&[f64::NAN]).is_err());
        assert_eq!(eff.num_samples(), 0);
    }

    #[test]
    fn test_efficiency_t_divides_by_task_count() {
        let mut eff = Efficiency::new(2).unwrap();
        eff.record_sample(&[1.0, 3.0]).unwrap();
        eff.record_sample(&[2.0, 4.0]).unwrap();

        assert_eq!(eff.num_samples(), 2);
        assert_eq!(eff.num_tasks(), 2);
        assert!((eff.average_total_time() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_efficiency_empty_and_reset() {
        let mut eff = Efficiency::new(3).unwrap();
        assert_eq!(eff.average_total_time(), 0.0);

        eff.record_sample(&[0.0, 0.0, 1.5]).unwrap();
        eff.reset();
        assert_eq!(eff.num_samples(), 0);
        assert_eq!(eff.average_total_time(), 0.0);
    }

    #[test]
    fn test_efficiency_error_display() {
        let err = EfficiencyError::WrongLength {
            expected: 4,
            actual: 1,
        };
        assert!(err.to_string().contains('4'));
    }

    // =========================================================================
    // Significance
    // =========================================================================

    #[test]
    fn test_welch_t_test_detects_gap() {
        let a = stats(&[90.0, 91.0, 92.0, 90.5, 91.5]);
        let b = stats(&[70.0, 71.0, 72.0, 70.5, 71.5]);
        let result = welch_t_test(&a, &b, 0.05).unwrap();
        assert!(result.t_statistic > 0.0);
        assert!(result.is_significant);
        assert_eq!(result.effect_interpretation, "large");
    }

    #[test]
    fn test_welch_t_test_insufficient() {
        let a = stats(&[90.0]);
        let b = stats(&[70.0, 72.0]);
        assert!(welch_t_test(&a, &b, 0.05).is_none());
        assert!(welch_t_test(&stats(&[50.0, 50.0]), &stats(&[60.0, 60.0]), 0.05).is_none());
    }

    #[test]
    fn test_bonferroni_correction() {
        assert!((bonferroni_correction(0.05, 5) - 0.01).abs() < 1e-12);
        assert!((bonferroni_correction(0.05, 0) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_interpret_cohens_d() {
        assert_eq!(interpret_cohens_d(0.1), "negligible");
        assert_eq!(interpret_cohens_d(-0.3), "small");
        assert_eq!(interpret_cohens_d(0.6), "medium");
        assert_eq!(interpret_cohens_d(1.2), "large");
    }
}
