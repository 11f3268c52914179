//! Calibration phase: cold-score a random sample that anchors every later
//! judgment.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use super::error::AnalysisError;
use super::with_timeout;
use crate::data::ScoredCommit;
use crate::git::CommitInfo;
use crate::scorer::EffortScorer;

/// Scored commits that phase-two judgments are made relative to.
///
/// Frozen once calibration completes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSet {
    commits: Vec<ScoredCommit>,
}

impl ReferenceSet {
    /// Wraps calibration results.
    pub fn new(commits: Vec<ScoredCommit>) -> Self {
        Self { commits }
    }

    /// Number of reference commits.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Returns true if calibration produced nothing.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Returns the reference commits.
    pub fn as_slice(&self) -> &[ScoredCommit] {
        &self.commits
    }

    /// Consumes the set, returning the calibration results.
    pub fn into_inner(self) -> Vec<ScoredCommit> {
        self.commits
    }

    /// Draws `min(count, len)` distinct references uniformly at random.
    pub fn draw<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<ScoredCommit> {
        self.commits.choose_multiple(rng, count).cloned().collect()
    }
}

/// Picks `min(sample_size, commits.len())` distinct commits uniformly at random.
pub(crate) fn select_sample<'a, R: Rng + ?Sized>(
    commits: &'a [CommitInfo],
    sample_size: usize,
    rng: &mut R,
) -> Vec<&'a CommitInfo> {
    commits.choose_multiple(rng, sample_size).collect()
}

/// Cold-scores the sample and freezes the result as the reference set.
///
/// Any scorer failure here is fatal to the analysis.
pub(crate) async fn calibrate(
    scorer: &dyn EffortScorer,
    sample: &[&CommitInfo],
    timeout: Duration,
) -> Result<ReferenceSet, AnalysisError> {
    info!(sample = sample.len(), "Analyzing initial sample of commits");

    let scored = with_timeout(timeout, scorer.score(sample))
        .await
        .map_err(AnalysisError::CalibrationFailure)?;

    info!(
        scored = scored.len(),
        "Completed initial analysis of calibration sample"
    );
    Ok(ReferenceSet::new(scored))
}
