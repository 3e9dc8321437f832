//! Benchmark loading and answer grading.
//!
//! A benchmark is a JSONL file with one question per line:
//!
//! ```text
//! {"id": "q1", "question": "What is 17 * 3?", "answer": "51"}
//! {"question": "Capital of France?", "answer": "Paris"}
//! ```
//!
//! Lines without an `id` are identified by their 1-based line number.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Tolerance for numeric answer comparison
const NUMERIC_TOLERANCE: f64 = 1e-6;

/// Errors that can occur during benchmark loading
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Benchmark file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid benchmark entry on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("No questions found in benchmark")]
    Empty,
}

/// A single question with its reference answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenchmarkItem {
    /// Item identifier
    pub id: String,
    /// Question text sent to the baseline
    pub question: String,
    /// Reference answer
    pub answer: String,
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<serde_json::Value>,
    question: String,
    answer: serde_json::Value,
}

/// Render ids and answers given as JSON numbers or strings uniformly
fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// A named collection of questions
#[derive(Debug, Clone)]
pub struct Benchmark {
    /// Benchmark name (file stem when loaded from disk)
    pub name: String,
    /// Questions in file order
    pub items: Vec<BenchmarkItem>,
}

impl Benchmark {
    /// Parse a benchmark from JSONL text
    ///
    /// # Errors
    ///
    /// Returns an error if a non-blank line is not a valid item or no items
    /// are present.
    pub fn from_jsonl_str(name: impl Into<String>, content: &str) -> Result<Self, BenchmarkError> {
        let mut items = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let raw: RawItem = serde_json::from_str(line).map_err(|source| BenchmarkError::Parse {
                line: line_number,
                source,
            })?;

            items.push(BenchmarkItem {
                id: raw
                    .id
                    .map_or_else(|| line_number.to_string(), value_to_string),
                question: raw.question,
                answer: value_to_string(raw.answer),
            });
        }

        if items.is_empty() {
            return Err(BenchmarkError::Empty);
        }

        Ok(Self {
            name: name.into(),
            items,
        })
    }

    /// Load a benchmark from a JSONL file
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist, can't be read or parsed, or
    /// contains no questions.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BenchmarkError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BenchmarkError::NotFound(path.display().to_string()));
        }

        let name = path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = std::fs::read_to_string(path)?;
        let benchmark = Self::from_jsonl_str(name, &content)?;

        tracing::info!(
            benchmark = %benchmark.name,
            questions = benchmark.len(),
            "Loaded benchmark"
        );
        Ok(benchmark)
    }

    /// Get total number of questions
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the benchmark is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get iterator over questions
    pub fn iter(&self) -> impl Iterator<Item = &BenchmarkItem> {
        self.items.iter()
    }
}

/// Normalize an answer for comparison
fn normalize_answer(answer: &str) -> String {
    let mut s = answer.trim().to_lowercase();

    loop {
        let before = s.len();
        for wrapper in ["**", "\"", "'", "`"] {
            if s.len() >= 2 * wrapper.len() && s.starts_with(wrapper) && s.ends_with(wrapper) {
                s = s[wrapper.len()..s.len() - wrapper.len()].trim().to_string();
            }
        }
        if let Some(stripped) = s.strip_suffix('.') {
            s = stripped.trim_end().to_string();
        }
        if s.len() == before {
            break;
        }
    }

    s.chars().filter(|c| !matches!(c, '$' | ',')).collect()
}

/// Compare a predicted answer against the reference
///
/// Both sides are normalized first. If both parse as numbers they are compared
/// within a small tolerance, otherwise as strings.
#[must_use]
pub fn answers_match(predicted: &str, expected: &str) -> bool {
    let predicted = normalize_answer(predicted);
    let expected = normalize_answer(expected);

    match (predicted.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(p), Ok(e)) => (p - e).abs() < NUMERIC_TOLERANCE,
        _ => predicted == expected,
    }
}
