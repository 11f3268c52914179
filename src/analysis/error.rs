//! Analysis workflow errors.

use thiserror::Error;

use crate::scorer::ScorerError;

/// Failures of one repository analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The commit history could not be produced.
    #[error("Failed to fetch commits: {0:#}")]
    SourceUnavailable(#[source] anyhow::Error),

    /// Cold scoring of the reference sample failed.
    #[error("Calibration scoring failed: {0}")]
    CalibrationFailure(#[source] ScorerError),

    /// A commit in a phase-two batch could not be scored.
    #[error("Scoring failed for commit {commit}: {source}")]
    BatchScoringFailure {
        /// Id of the commit whose scoring failed.
        commit: String,
        /// Underlying scorer failure.
        #[source]
        source: ScorerError,
    },

    /// The workflow settings are unusable.
    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    /// Returns the scorer failure behind this error, if any.
    pub fn scorer_error(&self) -> Option<&ScorerError> {
        match self {
            Self::CalibrationFailure(source) | Self::BatchScoringFailure { source, .. } => {
                Some(source)
            }
            Self::SourceUnavailable(_) | Self::InvalidConfig(_) => None,
        }
    }
}
