//! CLI interface for repo-rank.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::analysis::EffortAnalyzer;
use crate::config::{AnalysisConfig, FailurePolicy, ScorerConfig};
use crate::scorer::create_default_scorer;

pub mod analyze;
pub mod serve;

/// repo-rank: ranks repository contributors by estimated commit effort.
#[derive(Parser)]
#[command(name = "repo-rank")]
#[command(about = "Ranks repository contributors by LLM-estimated commit effort", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Runs the HTTP API.
    Serve(serve::ServeCommand),
    /// Analyzes one repository and prints the JSON report.
    Analyze(analyze::AnalyzeCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve(cmd) => cmd.execute().await,
            Commands::Analyze(cmd) => cmd.execute().await,
        }
    }
}

/// Workflow and model flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Number of commits scored cold to calibrate the scale.
    #[arg(long, default_value_t = 5)]
    pub sample_size: usize,

    /// Number of reference commits shown with each remaining commit.
    #[arg(long, default_value_t = 4)]
    pub reference_sample_size: usize,

    /// Number of commits per scoring batch.
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Maximum number of batches scored at once.
    #[arg(long, default_value_t = 4)]
    pub max_concurrent_batches: usize,

    /// Per-call scoring timeout in seconds.
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Seed for reproducible sampling.
    #[arg(long)]
    pub seed: Option<u64>,

    /// What to do when a commit cannot be scored.
    #[arg(long, value_enum, default_value_t = FailurePolicy::FailRequest)]
    pub failure_policy: FailurePolicy,

    /// Gemini model to use (overrides environment configuration).
    #[arg(long)]
    pub model: Option<String>,
}

impl AnalysisArgs {
    /// Converts the flags into workflow settings.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            sample_size: self.sample_size,
            reference_sample_size: self.reference_sample_size,
            batch_size: self.batch_size,
            max_concurrent_batches: self.max_concurrent_batches,
            scoring_timeout: Duration::from_secs(self.timeout_secs),
            seed: self.seed,
            failure_policy: self.failure_policy,
        }
    }

    /// Reads the scorer configuration and applies the model override.
    pub fn scorer_config(&self) -> Result<ScorerConfig> {
        let config = ScorerConfig::from_env()?;
        Ok(match &self.model {
            Some(model) => config.with_model(model.clone()),
            None => config,
        })
    }

    /// Builds the analyzer with a Gemini-backed scorer.
    pub fn build_analyzer(&self) -> Result<EffortAnalyzer> {
        let analysis_config = self.analysis_config();
        analysis_config
            .validate()
            .context("Invalid analysis flags")?;

        let scorer = create_default_scorer(&self.scorer_config()?)?;
        let metadata = scorer.get_ai_client_metadata();
        debug!(
            provider = %metadata.provider,
            model = %metadata.model,
            "Using effort scorer"
        );
        Ok(EffortAnalyzer::new(Arc::new(scorer), analysis_config))
    }
}
