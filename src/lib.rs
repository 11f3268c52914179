//! # repo-rank
//!
//! Ranks the contributors of a git repository by LLM-estimated commit effort.
//!
//! ## Workflow
//!
//! - Clone the repository and extract every commit with its patch
//! - Score a random calibration sample without references
//! - Score every remaining commit against references drawn from that sample
//! - Roll effort up per author
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use repo_rank::analysis::{AnalysisConfig, EffortAnalyzer};
//! use repo_rank::config::ScorerConfig;
//! use repo_rank::git::GitHubCommitSource;
//! use repo_rank::scorer::create_default_scorer;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let scorer = create_default_scorer(&ScorerConfig::from_env()?)?;
//! let analyzer = EffortAnalyzer::new(Arc::new(scorer), AnalysisConfig::default());
//! let report = analyzer
//!     .contributor_effort(&GitHubCommitSource::new(), "rust-lang", "log")
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod data;
pub mod git;
pub mod scorer;
pub mod server;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of repo-rank.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
