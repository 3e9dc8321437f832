//! Reasoning Eval CLI
//!
//! Prompt-based reasoning baseline evaluation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reasoning_eval::{
    build_model, AppConfig, Baseline, BaselineKind, Benchmark, ExperimentReport, ExperimentRunner,
    ModelProvider, RunOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reasoning-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run baselines over a benchmark and report accuracy and efficiency
    Run {
        #[command(flatten)]
        model: ModelArgs,

        /// Benchmark file (JSONL with question/answer per line)
        #[arg(long)]
        benchmark: PathBuf,

        /// Baselines to evaluate (default: all)
        #[arg(long, value_delimiter = ',')]
        baselines: Vec<String>,

        /// Number of runs (overrides config; 5+ recommended)
        #[arg(long)]
        runs: Option<usize>,

        #[command(flatten)]
        prompt: PromptArgs,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Answer a single question and print the response record as JSON
    Ask {
        #[command(flatten)]
        model: ModelArgs,

        /// Baseline to use
        #[arg(long, default_value = "zero-shot-cot")]
        baseline: String,

        #[command(flatten)]
        prompt: PromptArgs,

        /// Question text
        question: String,
    },

    /// List available baselines
    Baselines,
}

#[derive(clap::Args)]
struct ModelArgs {
    /// Provider (gpt, gemini, deepseek, llama, qwen, claude-cli, gemini-cli)
    #[arg(long, default_value = "gpt")]
    provider: String,

    /// Model name (defaults to the provider's configured model)
    #[arg(long)]
    model: Option<String>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct PromptArgs {
    /// Sampling temperature (overrides config)
    #[arg(long)]
    temperature: Option<f64>,

    /// System prompt prepended to every prompt
    #[arg(long)]
    system_prompt: Option<String>,

    /// Instruction placed before the question
    #[arg(long)]
    instruction: Option<String>,

    /// Skip the answer-extraction call of two-stage chain-of-thought
    #[arg(long)]
    no_extract: bool,
}

impl PromptArgs {
    fn to_options(&self, config: &AppConfig) -> RunOptions {
        let mut options = RunOptions::default()
            .with_temperature(self.temperature.unwrap_or(config.experiment.temperature))
            .with_extract_answer(!self.no_extract);
        if let Some(system_prompt) = &self.system_prompt {
            options = options.with_system_prompt(system_prompt);
        }
        if let Some(instruction) = &self.instruction {
            options = options.with_instruction(instruction);
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

fn parse_baselines(names: &[String]) -> Result<Vec<BaselineKind>> {
    if names.is_empty() {
        return Ok(BaselineKind::all().to_vec());
    }
    names
        .iter()
        .map(|name| name.parse::<BaselineKind>().map_err(anyhow::Error::from))
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            model,
            benchmark: benchmark_path,
            baselines,
            runs,
            prompt,
            output,
            format,
        } => {
            let config = load_config(model.config.as_deref())?;
            let provider: ModelProvider = model.provider.parse()?;
            let llm = build_model(provider, model.model.as_deref(), None, &config)?;
            let kinds = parse_baselines(&baselines)?;
            let benchmark = Benchmark::load(&benchmark_path).with_context(|| {
                format!("Failed to load benchmark {}", benchmark_path.display())
            })?;
            let options = prompt.to_options(&config);
            let runner = ExperimentRunner::new(runs.unwrap_or(config.experiment.runs));

            tracing::info!(
                provider = %provider,
                model = llm.model_name(),
                benchmark = %benchmark.name,
                baselines = ?kinds,
                runs = runner.runs(),
                "Starting evaluation"
            );

            let mut results = Vec::with_capacity(kinds.len());
            for kind in kinds {
                let mut baseline = kind.build(Arc::clone(&llm));
                let result = runner
                    .run(baseline.as_mut(), &benchmark, &options)
                    .with_context(|| format!("{kind} failed"))?;
                results.push(result);
            }

            let report = ExperimentReport::new(llm.model_name(), results);
            let rendered = match format {
                OutputFormat::Text => report.to_text(),
                OutputFormat::Markdown => report.to_markdown(),
                OutputFormat::Json => report.to_json()?,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "Report written");
                    report.print_summary();
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Ask {
            model,
            baseline,
            prompt,
            question,
        } => {
            let config = load_config(model.config.as_deref())?;
            let provider: ModelProvider = model.provider.parse()?;
            let llm = build_model(provider, model.model.as_deref(), None, &config)?;
            let kind: BaselineKind = baseline.parse()?;
            let options = prompt.to_options(&config);

            let mut baseline = kind.build(llm);
            let response = baseline.run(&question, &options)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Baselines => {
            println!("Available baselines");
            println!("===================");
            for kind in BaselineKind::all() {
                println!("  {:<24} {}", kind.as_str(), kind.description());
            }
        }
    }

    Ok(())
}
