//! `serve` command.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use super::AnalysisArgs;
use crate::config::ServerConfig;
use crate::git::GitHubCommitSource;
use crate::server::{self, AppState};

/// Runs the HTTP API.
#[derive(Parser)]
pub struct ServeCommand {
    /// Interface to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// TCP port to listen on.
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    /// Workflow and model flags.
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

impl ServeCommand {
    /// Executes the serve command.
    pub async fn execute(self) -> Result<()> {
        let state = AppState {
            source: Arc::new(GitHubCommitSource::new()),
            analyzer: self.analysis.build_analyzer()?,
        };
        let config = ServerConfig {
            bind: self.bind,
            port: self.port,
        };
        server::serve(&config, state).await
    }
}
