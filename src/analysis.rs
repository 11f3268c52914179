//! Two-phase effort estimation over a repository's commit history.
//!
//! A random calibration sample is scored cold and frozen as the reference
//! set. Every other commit is then scored against a fresh random draw from
//! that set, in bounded-concurrency batches.

pub mod aggregate;
pub mod error;
pub mod sampler;
pub(crate) mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub use aggregate::{merge, summarize_contributors, ContributorBreakdown};
pub use error::AnalysisError;
pub use sampler::ReferenceSet;

pub use crate::config::{AnalysisConfig, FailurePolicy};
use crate::data::{AnalysisReport, ContributorReport, ScoredCommit};
use crate::git::{CommitInfo, CommitSource};
use crate::scorer::client::ScoreFuture;
use crate::scorer::{EffortScorer, ScorerError};

/// Runs the estimation workflow with a shared scorer.
#[derive(Clone)]
pub struct EffortAnalyzer {
    scorer: Arc<dyn EffortScorer>,
    config: AnalysisConfig,
}

impl EffortAnalyzer {
    /// Creates an analyzer.
    pub fn new(scorer: Arc<dyn EffortScorer>, config: AnalysisConfig) -> Self {
        Self { scorer, config }
    }

    /// Returns the workflow settings.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Scores every commit exactly once.
    ///
    /// Calibration results come first, followed by phase-two results in
    /// input order. Under [`FailurePolicy::SkipCommit`] commits that failed
    /// phase-two scoring are absent.
    pub async fn analyze(&self, commits: &[CommitInfo]) -> Result<Vec<ScoredCommit>, AnalysisError> {
        self.config.validate()?;

        if commits.is_empty() {
            info!("No commits to analyze");
            return Ok(Vec::new());
        }

        let mut rng = self.config.rng();
        let scorer = self.scorer.as_ref();

        let sample = sampler::select_sample(commits, self.config.sample_size, &mut rng);
        let references = sampler::calibrate(scorer, &sample, self.config.scoring_timeout).await?;

        let remaining = scheduler::remaining_commits(commits, references.as_slice());
        let batches = scheduler::plan_batches(
            &remaining,
            self.config.batch_size,
            &references,
            self.config.reference_sample_size,
            &mut rng,
        );
        let relative = scheduler::score_batches(scorer, &batches, &self.config).await?;

        let analyses = merge(references.into_inner(), relative);
        info!(
            commits = commits.len(),
            scored = analyses.len(),
            "Completed effort analysis"
        );
        Ok(analyses)
    }

    /// Fetches and scores a repository's history.
    pub async fn analyze_repository(
        &self,
        source: &dyn CommitSource,
        owner: &str,
        repo: &str,
    ) -> Result<AnalysisReport, AnalysisError> {
        let (commits, analyses) = self.fetch_and_analyze(source, owner, repo).await?;
        Ok(AnalysisReport {
            repository: format!("{owner}/{repo}"),
            total_commits: commits.len(),
            analyses,
        })
    }

    /// Fetches and scores a repository's history, then rolls effort up per
    /// author.
    pub async fn contributor_effort(
        &self,
        source: &dyn CommitSource,
        owner: &str,
        repo: &str,
    ) -> Result<ContributorReport, AnalysisError> {
        let (commits, analyses) = self.fetch_and_analyze(source, owner, repo).await?;
        let breakdown = summarize_contributors(&analyses, &commits);
        Ok(ContributorReport {
            repository: format!("{owner}/{repo}"),
            total_effort: breakdown.total_effort,
            contributors: breakdown.contributors,
        })
    }

    async fn fetch_and_analyze(
        &self,
        source: &dyn CommitSource,
        owner: &str,
        repo: &str,
    ) -> Result<(Vec<CommitInfo>, Vec<ScoredCommit>), AnalysisError> {
        info!(repository = %format!("{owner}/{repo}"), "Starting analysis");
        let commits = source
            .fetch_commits(owner, repo)
            .await
            .map_err(AnalysisError::SourceUnavailable)?;
        let analyses = self.analyze(&commits).await?;
        Ok((commits, analyses))
    }
}

/// Bounds one scorer call by `timeout`.
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    call: ScoreFuture<'_, T>,
) -> Result<T, ScorerError> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(ScorerError::Timeout(timeout)))
}
