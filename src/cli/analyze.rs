//! `analyze` command.

use anyhow::{Context, Result};
use clap::Parser;

use super::AnalysisArgs;
use crate::git::GitHubCommitSource;

/// Analyzes one repository and prints the JSON report to stdout.
#[derive(Parser)]
pub struct AnalyzeCommand {
    /// Repository owner.
    pub owner: String,

    /// Repository name.
    pub repo: String,

    /// Prints the per-contributor breakdown instead of per-commit scores.
    #[arg(long)]
    pub contributors: bool,

    /// Workflow and model flags.
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

impl AnalyzeCommand {
    /// Executes the analyze command.
    pub async fn execute(self) -> Result<()> {
        let analyzer = self.analysis.build_analyzer()?;
        let source = GitHubCommitSource::new();

        let output = if self.contributors {
            let report = analyzer
                .contributor_effort(&source, &self.owner, &self.repo)
                .await?;
            serde_json::to_string_pretty(&report)
        } else {
            let report = analyzer
                .analyze_repository(&source, &self.owner, &self.repo)
                .await?;
            serde_json::to_string_pretty(&report)
        }
        .context("Failed to serialize report")?;

        println!("{output}");
        Ok(())
    }
}
