//! Relative-scoring phase: score every remaining commit against references
//! drawn from the calibration set.

use std::collections::HashSet;

use futures::future::join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use rand::Rng;
use tracing::{debug, info, warn};

use super::error::AnalysisError;
use super::sampler::ReferenceSet;
use super::with_timeout;
use crate::config::{AnalysisConfig, FailurePolicy};
use crate::data::ScoredCommit;
use crate::git::CommitInfo;
use crate::scorer::EffortScorer;

/// A commit paired with the references it will be judged against.
#[derive(Debug, Clone)]
pub(crate) struct ScheduledCommit<'a> {
    pub commit: &'a CommitInfo,
    pub references: Vec<ScoredCommit>,
}

/// Returns commits whose ids do not appear among the calibration results,
/// in input order.
pub(crate) fn remaining_commits<'a>(
    commits: &'a [CommitInfo],
    calibrated: &[ScoredCommit],
) -> Vec<&'a CommitInfo> {
    let scored: HashSet<&str> = calibrated.iter().map(|s| s.id.as_str()).collect();
    commits
        .iter()
        .filter(|commit| !scored.contains(commit.id.as_str()))
        .collect()
}

/// Splits `remaining` into consecutive batches of at most `batch_size`,
/// drawing an independent reference sample for each commit.
///
/// Draws happen here, in commit order, so a seeded generator yields the same
/// plan regardless of how batches are later interleaved.
pub(crate) fn plan_batches<'a, R: Rng + ?Sized>(
    remaining: &[&'a CommitInfo],
    batch_size: usize,
    references: &ReferenceSet,
    reference_sample_size: usize,
    rng: &mut R,
) -> Vec<Vec<ScheduledCommit<'a>>> {
    remaining
        .chunks(batch_size.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(|&commit| ScheduledCommit {
                    commit,
                    references: references.draw(reference_sample_size, rng),
                })
                .collect()
        })
        .collect()
}

/// Scores every planned batch, with at most `max_concurrent_batches` in
/// flight. Results come back in plan order.
pub(crate) async fn score_batches(
    scorer: &dyn EffortScorer,
    batches: &[Vec<ScheduledCommit<'_>>],
    config: &AnalysisConfig,
) -> Result<Vec<ScoredCommit>, AnalysisError> {
    let total = batches.len();
    info!(
        batches = total,
        concurrency = config.max_concurrent_batches,
        "Processing remaining commits in batches"
    );

    // Built up front so the stream holds concrete futures; they stay lazy
    // until `buffered` polls them.
    let pending: Vec<_> = batches
        .iter()
        .enumerate()
        .map(|(index, batch)| score_batch(scorer, index, total, batch, config))
        .collect();

    stream::iter(pending)
        .buffered(config.max_concurrent_batches.max(1))
        .try_concat()
        .await
}

/// Scores all commits of one batch concurrently, then applies the failure
/// policy to the collected outcomes.
async fn score_batch(
    scorer: &dyn EffortScorer,
    index: usize,
    total: usize,
    batch: &[ScheduledCommit<'_>],
    config: &AnalysisConfig,
) -> Result<Vec<ScoredCommit>, AnalysisError> {
    debug!(
        batch = index + 1,
        total,
        commits = batch.len(),
        "Dispatching batch"
    );

    let outcomes = join_all(batch.iter().map(|scheduled| {
        with_timeout(
            config.scoring_timeout,
            scorer.score_with_references(scheduled.commit, &scheduled.references),
        )
    }))
    .await;

    let mut scored = Vec::with_capacity(batch.len());
    for (scheduled, outcome) in batch.iter().zip(outcomes) {
        match outcome {
            Ok(judgment) => scored.push(judgment),
            Err(source) => match config.failure_policy {
                FailurePolicy::FailRequest => {
                    return Err(AnalysisError::BatchScoringFailure {
                        commit: scheduled.commit.id.clone(),
                        source,
                    });
                }
                FailurePolicy::SkipCommit => {
                    warn!(
                        commit = %scheduled.commit.short_hash(),
                        error = %source,
                        "Skipping commit that could not be scored"
                    );
                }
            },
        }
    }

    info!(
        batch = index + 1,
        total,
        scored = scored.len(),
        "Completed batch"
    );
    Ok(scored)
}
