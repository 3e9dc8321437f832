//! Zero-shot chain-of-thought prompting.
//!
//! Appending "Let's think step by step." elicits a reasoning trace without any
//! demonstrations. Two variants:
//!
//! - [`ZeroShotCoT`]: reasoning call, then a deterministic (temperature 0)
//!   extraction call that distills the final answer.
//! - [`ZeroShotCoTSinglePass`]: one call that asks for a `**Final Answer:**`
//!   label; the answer is parsed out of the same completion.
//!
//! Reference: Kojima et al., "Large Language Models are Zero-Shot Reasoners",
//! NeurIPS 2022.

use super::{Baseline, BaselineExecutor, BaselineResponse, Metadata, RunOptions};
use crate::llm::{LanguageModel, LlmError};
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};

pub(crate) const BASELINE_NAME: &str = "ZeroShotCoT";
pub(crate) const SINGLE_PASS_BASELINE_NAME: &str = "ZeroShotCoT-SinglePass";

/// Trigger phrase from Kojima et al. (2022)
pub const COT_TRIGGER: &str = "Let's think step by step.";

/// Default answer-extraction cue
pub const DEFAULT_EXTRACTION_PROMPT: &str = "Therefore, the answer is";

/// Extraction always runs greedy, whatever the reasoning temperature
const EXTRACTION_TEMPERATURE: f64 = 0.0;

/// Leading "Therefore, the answer is:" style lead-in
static ANSWER_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:therefore,?)?\s*(?:the)?\s*answer\s*(?:is)?\s*[:=]?\s*")
        .expect("answer lead-in pattern is valid")
});

/// `**Final Answer:** ...` label, bold markers and colon optional
static FINAL_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*?\*?Final Answer:?\*?\*?\s*(.+?)(?:\n|$)")
        .expect("final answer pattern is valid")
});

/// Checked in order; at most one is stripped
const RESIDUAL_PREFIXES: [&str; 4] = [":", "is", "is:", "="];

/// Best-effort answer extraction from an extraction-stage completion.
///
/// Keeps the first line, strips a "Therefore, the answer is" lead-in and one
/// residual `:`/`is`/`=` prefix, then trailing periods. Never fails: text with
/// no recognizable pattern comes back trimmed.
#[must_use]
pub fn extract_answer_simple(text: &str) -> String {
    let mut answer = text.trim();

    if let Some((first_line, _)) = answer.split_once('\n') {
        answer = first_line.trim();
    }

    if let Some(lead) = ANSWER_LEAD.find(answer) {
        answer = answer[lead.end()..].trim();
    }

    if let Some(prefix) = RESIDUAL_PREFIXES
        .iter()
        .find(|prefix| starts_with_ignore_ascii_case(answer, prefix))
    {
        answer = answer[prefix.len()..].trim();
    }

    answer.trim_end_matches('.').to_string()
}

fn starts_with_ignore_ascii_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Two-stage zero-shot chain-of-thought
#[derive(Debug)]
pub struct ZeroShotCoT {
    executor: BaselineExecutor,
    cot_trigger: String,
    extraction_prompt: String,
}

impl ZeroShotCoT {
    /// Bind the baseline to a model with the default trigger and extraction cue
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            executor: BaselineExecutor::new(llm, BASELINE_NAME),
            cot_trigger: COT_TRIGGER.to_string(),
            extraction_prompt: DEFAULT_EXTRACTION_PROMPT.to_string(),
        }
    }

    /// Override the reasoning trigger phrase (empty keeps the default)
    #[must_use]
    pub fn with_cot_trigger(mut self, cot_trigger: impl Into<String>) -> Self {
        let cot_trigger = cot_trigger.into();
        if !cot_trigger.is_empty() {
            self.cot_trigger = cot_trigger;
        }
        self
    }

    /// Override the extraction cue (empty keeps the default)
    #[must_use]
    pub fn with_extraction_prompt(mut self, extraction_prompt: impl Into<String>) -> Self {
        let extraction_prompt = extraction_prompt.into();
        if !extraction_prompt.is_empty() {
            self.extraction_prompt = extraction_prompt;
        }
        self
    }

    /// Trigger phrase in use
    #[must_use]
    pub fn cot_trigger(&self) -> &str {
        &self.cot_trigger
    }

    /// Extraction cue in use
    #[must_use]
    pub fn extraction_prompt(&self) -> &str {
        &self.extraction_prompt
    }

    /// Counters of the most recent run
    #[must_use]
    pub const fn executor(&self) -> &BaselineExecutor {
        &self.executor
    }

    /// Prompt for the reasoning stage
    #[must_use]
    pub fn build_reasoning_prompt(&self, question: &str, options: &RunOptions) -> String {
        let question = format!("Question: {question}");
        let answer = format!("Answer: {}", self.cot_trigger);
        options.assemble_prompt(&[&question, &answer])
    }

    /// Prompt for the extraction stage
    #[must_use]
    pub fn build_extraction_prompt(&self, question: &str, reasoning: &str) -> String {
        format!(
            "Question: {question}\n\nAnswer: {} {reasoning}\n\n{}",
            self.cot_trigger, self.extraction_prompt
        )
    }
}

impl Baseline for ZeroShotCoT {
    fn name(&self) -> &str {
        self.executor.baseline_type()
    }

    fn run(&mut self, question: &str, options: &RunOptions) -> Result<BaselineResponse, LlmError> {
        self.executor.reset_counters();
        let mut intermediate_steps = Vec::with_capacity(2);

        let reasoning_prompt = self.build_reasoning_prompt(question, options);
        let reasoning_response = self
            .executor
            .call_llm(&reasoning_prompt, options.temperature)?;
        let reasoning = reasoning_response.content.trim().to_string();
        intermediate_steps.push(format!("[Reasoning]\n{reasoning}"));

        let final_answer = if options.extract_answer {
            let extraction_prompt = self.build_extraction_prompt(question, &reasoning);
            let extraction = self
                .executor
                .call_llm(&extraction_prompt, EXTRACTION_TEMPERATURE)?;
            intermediate_steps.push(format!("[Extraction]\n{}", extraction.content.trim()));

            let answer = extract_answer_simple(&extraction.content);
            tracing::debug!(answer = %answer, "Extracted final answer");
            answer
        } else {
            reasoning.clone()
        };

        let mut metadata = Metadata::new();
        metadata.insert("reasoning_prompt".to_string(), json!(reasoning_prompt));
        metadata.insert("model".to_string(), json!(reasoning_response.model_name));
        metadata.insert("cot_trigger".to_string(), json!(self.cot_trigger));
        metadata.insert("extract_answer".to_string(), json!(options.extract_answer));

        Ok(self.executor.create_response(
            final_answer,
            format!("{} {reasoning}", self.cot_trigger),
            intermediate_steps,
            metadata,
        ))
    }
}

/// Single-call zero-shot chain-of-thought with a labelled final answer
#[derive(Debug)]
pub struct ZeroShotCoTSinglePass {
    executor: BaselineExecutor,
}

impl ZeroShotCoTSinglePass {
    /// Bind the baseline to a model
    #[must_use]
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            executor: BaselineExecutor::new(llm, SINGLE_PASS_BASELINE_NAME),
        }
    }

    /// Counters of the most recent run
    #[must_use]
    pub const fn executor(&self) -> &BaselineExecutor {
        &self.executor
    }

    /// Build the single-pass prompt
    #[must_use]
    pub fn build_prompt(&self, question: &str, options: &RunOptions) -> String {
        let question = format!("Question: {question}");
        let directive = format!(
            "{COT_TRIGGER}\n\
             After your reasoning, provide your final answer in the format:\n\
             **Final Answer:** [your answer]"
        );
        options.assemble_prompt(&[&question, &directive])
    }

    /// Split a completion into `(final_answer, reasoning_trace)`.
    ///
    /// Falls back to the last non-empty line when no `Final Answer` label is
    /// present; the model's last line may then be commentary.
    #[must_use]
    pub fn parse_response(response_text: &str) -> (String, String) {
        if let Some(captures) = FINAL_ANSWER.captures(response_text) {
            let whole = captures.get(0).map_or(0, |m| m.start());
            let answer = captures.get(1).map_or("", |m| m.as_str());
            return (
                answer.trim().to_string(),
                response_text[..whole].trim().to_string(),
            );
        }

        tracing::debug!("No final answer label; using last line");

        let lines: Vec<&str> = response_text.trim().split('\n').collect();
        match lines.iter().rposition(|line| !line.trim().is_empty()) {
            Some(last) => (lines[last].trim().to_string(), lines[..last].join("\n")),
            None => (String::new(), String::new()),
        }
    }
}

impl Baseline for ZeroShotCoTSinglePass {
    fn name(&self) -> &str {
        self.executor.baseline_type()
    }

    fn run(&mut self, question: &str, options: &RunOptions) -> Result<BaselineResponse, LlmError> {
        self.executor.reset_counters();

        let prompt = self.build_prompt(question, options);
        let response = self.executor.call_llm(&prompt, options.temperature)?;
        let (final_answer, reasoning_trace) = Self::parse_response(&response.content);

        let mut metadata = Metadata::new();
        metadata.insert("prompt".to_string(), json!(prompt));
        metadata.insert("model".to_string(), json!(response.model_name));
        metadata.insert("single_pass".to_string(), json!(true));

        Ok(self.executor.create_response(
            final_answer,
            reasoning_trace,
            vec![response.content.trim().to_string()],
            metadata,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::baselines::mock::{FailingModel, FlakyModel, ScriptedModel};

    fn scripted(responses: &[&str]) -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel::new(responses, 10, 10))
    }

    fn as_port(model: &Arc<ScriptedModel>) -> Arc<dyn LanguageModel> {
        Arc::clone(model) as Arc<dyn LanguageModel>
    }

    // =========================================================================
    // extract_answer_simple
    // =========================================================================

    #[test]
    fn test_extraction_logic() {
        assert_eq!(extract_answer_simple("Therefore, the answer is 42."), "42");
        assert_eq!(extract_answer_simple("The answer is: Paris"), "Paris");
        assert_eq!(extract_answer_simple("42\nSome other text"), "42");
    }

    #[test]
    fn test_extraction_without_pattern_returns_trimmed() {
        assert_eq!(extract_answer_simple("  Paris  "), "Paris");
        assert_eq!(extract_answer_simple(""), "");
        assert_eq!(extract_answer_simple("\n\n"), "");
    }

    #[test]
    fn test_extraction_separators() {
        assert_eq!(extract_answer_simple("answer = 7"), "7");
        assert_eq!(extract_answer_simple("ANSWER: (B)"), "(B)");
        assert_eq!(extract_answer_simple("Therefore the answer is 3..."), "3");
    }

    #[test]
    fn test_extraction_strips_one_residual_prefix() {
        assert_eq!(extract_answer_simple("is 12"), "12");
        // "is" is checked before "is:", so the colon survives
        assert_eq!(extract_answer_simple("is: 12"), ": 12");
        assert_eq!(extract_answer_simple("= 5"), "5");
        assert_eq!(extract_answer_simple(": : 9"), ": 9");
    }

    #[test]
    fn test_extraction_keeps_first_line_only() {
        assert_eq!(
            extract_answer_simple("  The answer is 18.\nBecause 3 * 6 = 18."),
            "18"
        );
    }

    // =========================================================================
    // ZeroShotCoT
    // =========================================================================

    #[test]
    fn test_prompt_building() {
        let model = scripted(&[]);
        let baseline = ZeroShotCoT::new(as_port(&model));
        let prompt =
            baseline.build_reasoning_prompt("How many legs does a cat have?", &RunOptions::default());

        assert!(prompt.contains("Question: How many legs does a cat have?"));
        assert!(prompt.ends_with("Answer: Let's think step by step."));
    }

    #[test]
    fn test_reasoning_prompt_with_preamble() {
        let model = scripted(&[]);
        let baseline = ZeroShotCoT::new(as_port(&model));
        let options = RunOptions::default()
            .with_system_prompt("sys")
            .with_instruction("inst");
        assert_eq!(
            baseline.build_reasoning_prompt("q", &options),
            "sys\n\ninst\n\nQuestion: q\n\nAnswer: Let's think step by step."
        );
    }

    #[test]
    fn test_extraction_prompt_format() {
        let model = scripted(&[]);
        let baseline = ZeroShotCoT::new(as_port(&model));
        assert_eq!(
            baseline.build_extraction_prompt("q", "r"),
            "Question: q\n\nAnswer: Let's think step by step. r\n\nTherefore, the answer is"
        );
    }

    #[test]
    fn test_custom_trigger_and_extraction_prompt() {
        let model = scripted(&[]);
        let baseline = ZeroShotCoT::new(as_port(&model))
            .with_cot_trigger("Let's work this out.")
            .with_extraction_prompt("So the result is");
        assert_eq!(baseline.cot_trigger(), "Let's work this out.");
        assert!(baseline
            .build_extraction_prompt("q", "r")
            .ends_with("So the result is"));

        let defaults = ZeroShotCoT::new(as_port(&model))
            .with_cot_trigger("")
            .with_extraction_prompt("");
        assert_eq!(defaults.cot_trigger(), COT_TRIGGER);
        assert_eq!(defaults.extraction_prompt(), DEFAULT_EXTRACTION_PROMPT);
    }

    #[test]
    fn test_run_two_stage_flow() {
        let model = scripted(&[
            "First, a cat is a mammal. Second, most mammals have 4 legs.",
            "4",
        ]);
        let mut baseline = ZeroShotCoT::new(as_port(&model));

        let response = baseline
            .run("How many legs does a cat have?", &RunOptions::default())
            .unwrap();

        assert_eq!(response.final_answer(), "4");
        assert!(response.reasoning_trace().contains("First, a cat is a mammal"));
        assert!(response.reasoning_trace().starts_with(COT_TRIGGER));
        assert_eq!(response.num_llm_calls(), 2);
        assert_eq!(response.total_tokens(), 40);
        assert_eq!(response.intermediate_steps().len(), 2);
        assert!(response.intermediate_steps()[0].starts_with("[Reasoning]"));
        assert_eq!(response.intermediate_steps()[1], "[Extraction]\n4");
        assert_eq!(response.metadata()["extract_answer"], true);
    }

    #[test]
    fn test_extraction_stage_is_greedy() {
        let model = scripted(&["reasoning", "The answer is 9."]);
        let mut baseline = ZeroShotCoT::new(as_port(&model));

        let response = baseline
            .run("q", &RunOptions::default().with_temperature(0.9))
            .unwrap();

        assert_eq!(response.final_answer(), "9");
        assert!((model.temperature(0) - 0.9).abs() < f64::EPSILON);
        assert!(model.temperature(1).abs() < f64::EPSILON);
        assert!(model.prompt(1).contains("Answer: Let's think step by step. reasoning"));
    }

    #[test]
    fn test_run_without_extraction() {
        let model = scripted(&["  Two plus two is four.  ", "unused"]);
        let mut baseline = ZeroShotCoT::new(as_port(&model));

        let response = baseline
            .run("2+2?", &RunOptions::default().with_extract_answer(false))
            .unwrap();

        assert_eq!(response.final_answer(), "Two plus two is four.");
        assert_eq!(response.num_llm_calls(), 1);
        assert_eq!(response.total_tokens(), 20);
        assert_eq!(response.intermediate_steps().len(), 1);
        assert_eq!(model.calls.borrow().len(), 1);
    }

    #[test]
    fn test_run_propagates_provider_error() {
        let mut baseline = ZeroShotCoT::new(Arc::new(FailingModel));
        let err = baseline.run("q", &RunOptions::default()).unwrap_err();
        assert!(matches!(err, LlmError::Provider { .. }));
    }

    #[test]
    fn test_extraction_failure_aborts_run() {
        let model = Arc::new(FlakyModel::new(&[
            Some("The cat has four legs."),
            None,
            Some("Spiders have eight legs."),
            Some("8"),
        ]));
        let mut baseline = ZeroShotCoT::new(Arc::clone(&model) as Arc<dyn LanguageModel>);

        let err = baseline.run("Cat legs?", &RunOptions::default()).unwrap_err();
        assert!(matches!(err, LlmError::Provider { .. }));
        assert_eq!(*model.calls.borrow(), 2);

        let response = baseline.run("Spider legs?", &RunOptions::default()).unwrap();
        assert_eq!(response.final_answer(), "8");
        assert_eq!(response.num_llm_calls(), 2);
        assert_eq!(response.total_tokens(), 40);
        assert_eq!(response.intermediate_steps().len(), 2);
        assert!(!response.reasoning_trace().contains("cat"));
    }

    // =========================================================================
    // ZeroShotCoTSinglePass
    // =========================================================================

    #[test]
    fn test_single_pass_prompt() {
        let model = scripted(&[]);
        let baseline = ZeroShotCoTSinglePass::new(as_port(&model));
        let prompt = baseline.build_prompt("Q", &RunOptions::default());

        assert!(prompt.starts_with("Question: Q\n\n"));
        assert!(prompt.contains("Let's think step by step"));
        assert!(prompt.contains("**Final Answer:** [your answer]"));
    }

    #[test]
    fn test_run_single_pass_parsing() {
        let model = scripted(&["Step 1: Calculate 10 + 5.\nStep 2: The result is 15.\nFinal Answer: 15"]);
        let mut baseline = ZeroShotCoTSinglePass::new(as_port(&model));

        let response = baseline.run("What is 10 + 5?", &RunOptions::default()).unwrap();

        assert_eq!(response.final_answer(), "15");
        assert!(response.reasoning_trace().contains("Step 1: Calculate 10 + 5"));
        assert!(!response.reasoning_trace().contains("Final Answer"));
        assert_eq!(response.num_llm_calls(), 1);
        assert_eq!(response.baseline_type(), "ZeroShotCoT-SinglePass");
        assert_eq!(response.metadata()["single_pass"], true);
    }

    #[test]
    fn test_run_single_pass_fallback() {
        let model = scripted(&["Thinking about it...\nThe answer is clearly 100"]);
        let mut baseline = ZeroShotCoTSinglePass::new(as_port(&model));

        let response = baseline.run("Q", &RunOptions::default()).unwrap();

        assert_eq!(response.final_answer(), "The answer is clearly 100");
        assert_eq!(response.reasoning_trace(), "Thinking about it...");
    }

    #[test]
    fn test_parse_response_bold_label() {
        let (answer, reasoning) =
            ZeroShotCoTSinglePass::parse_response("Some work.\n**Final Answer:** 24\nextra");
        assert_eq!(answer, "24");
        assert_eq!(reasoning, "Some work.");
    }

    #[test]
    fn test_parse_response_case_insensitive() {
        let (answer, _) = ZeroShotCoTSinglePass::parse_response("final answer 7");
        assert_eq!(answer, "7");
    }

    #[test]
    fn test_parse_response_single_line_fallback() {
        let (answer, reasoning) = ZeroShotCoTSinglePass::parse_response("  42  ");
        assert_eq!(answer, "42");
        assert_eq!(reasoning, "");
    }

    #[test]
    fn test_parse_response_empty() {
        let (answer, reasoning) = ZeroShotCoTSinglePass::parse_response("   ");
        assert_eq!(answer, "");
        assert_eq!(reasoning, "");
    }
}
