//! Zero-shot (input/output) prompting.
//!
//! The model sees the question and nothing else; whatever follows `Answer:`
//! is taken verbatim as the answer.
//!
//! Reference: Brown et al., "Language Models are Few-Shot Learners" (2020).

use super::{Baseline, BaselineExecutor, BaselineResponse, Metadata, RunOptions};
use crate::llm::{LanguageModel, LlmError};
use serde_json::json;
use std::sync::Arc;

pub(crate) const BASELINE_NAME: &str = "ZeroShot";

/// Direct prompting without demonstrations or reasoning
#[derive(Debug)]
pub struct ZeroShot {
    executor: BaselineExecutor,
}

impl ZeroShot {
    /// Bind the baseline to a model
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            executor: BaselineExecutor::new(llm, BASELINE_NAME),
        }
    }

    /// Build the zero-shot prompt
    #[must_use]
    pub fn build_prompt(&self, question: &str, options: &RunOptions) -> String {
        let question = format!("Question: {question}");
        options.assemble_prompt(&[&question, "Answer:"])
    }

    /// Counters of the most recent run
    #[must_use]
    pub const fn executor(&self) -> &BaselineExecutor {
        &self.executor
    }
}

impl Baseline for ZeroShot {
    fn name(&self) -> &str {
        self.executor.baseline_type()
    }

    fn run(&mut self, question: &str, options: &RunOptions) -> Result<BaselineResponse, LlmError> {
        self.executor.reset_counters();

        let prompt = self.build_prompt(question, options);
        let response = self.executor.call_llm(&prompt, options.temperature)?;

        let mut metadata = Metadata::new();
        metadata.insert("prompt".to_string(), json!(prompt));
        metadata.insert("model".to_string(), json!(response.model_name));

        Ok(self.executor.create_response(
            response.content.trim(),
            "",
            Vec::new(),
            metadata,
        ))
    }
}
