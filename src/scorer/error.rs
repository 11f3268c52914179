//! Effort scorer error handling.

use std::time::Duration;

use thiserror::Error;

/// Failures of the effort-scoring backend.
#[derive(Error, Debug)]
pub enum ScorerError {
    /// API key not found in environment variables or settings.
    #[error("Gemini API key not found. Set the GEMINI_API_KEY environment variable")]
    ApiKeyNotFound,

    /// The backend answered with a non-success status.
    #[error("Scoring API request failed: {0}")]
    ApiRequestFailed(String),

    /// The backend's response envelope could not be read.
    #[error("Invalid response format from scoring API: {0}")]
    InvalidResponseFormat(String),

    /// The model's answer does not match the expected judgment shape.
    #[error("Malformed effort judgment: {0}")]
    MalformedOutput(String),

    /// Rate limit exceeded for the scoring API.
    #[error("Rate limit exceeded. Please try again later")]
    RateLimitExceeded,

    /// Network connectivity error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The call did not finish within the per-call timeout.
    #[error("Scoring call timed out after {0:?}")]
    Timeout(Duration),
}

impl ScorerError {
    /// Returns true when the backend answered but the answer was unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedOutput(_) | Self::InvalidResponseFormat(_))
    }

    /// Recovers a typed error from an `anyhow` chain produced by an
    /// [`AiClient`](crate::scorer::AiClient).
    pub(crate) fn from_client_error(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(scorer_error) => scorer_error,
            Err(other) => Self::ApiRequestFailed(format!("{other:#}")),
        }
    }
}
