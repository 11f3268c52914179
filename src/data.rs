//! Data structures shared by the scoring workflow and the API responses.

use serde::{Deserialize, Serialize};

/// Lowest effort score a commit can receive.
pub const MIN_EFFORT: f64 = 1.0;

/// Highest effort score a commit can receive.
pub const MAX_EFFORT: f64 = 10.0;

/// Effort judgment for a single commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCommit {
    /// Full SHA-1 of the scored commit.
    #[serde(rename = "hash")]
    pub id: String,
    /// First line of the commit message.
    pub title: String,
    /// Model reasoning behind the score.
    pub reasoning: String,
    /// Description of the commit's changes and impact.
    pub description: String,
    /// Effort score in `[MIN_EFFORT, MAX_EFFORT]`.
    pub effort: f64,
}

/// Effort attributed to one author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorSummary {
    /// Author name as recorded in the commit.
    pub author: String,
    /// Sum of effort over the author's scored commits.
    #[serde(rename = "effort")]
    pub total_effort: f64,
    /// Share of the repository-wide effort, `0.0` when nothing was scored.
    pub proportion: f64,
}

/// Response body of the per-commit analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// `owner/repo`.
    pub repository: String,
    /// Number of commits extracted from the repository.
    pub total_commits: usize,
    /// One entry per scored commit.
    pub analyses: Vec<ScoredCommit>,
}

/// Response body of the per-contributor breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ContributorReport {
    /// `owner/repo`.
    pub repository: String,
    /// Sum of all commit efforts.
    pub total_effort: f64,
    /// Contributors ordered by descending effort.
    pub contributors: Vec<ContributorSummary>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn scored_commit_serializes_id_as_hash() {
        let scored = ScoredCommit {
            id: "abc123".to_string(),
            title: "feat: add login".to_string(),
            reasoning: "new module".to_string(),
            description: "adds login".to_string(),
            effort: 4.0,
        };
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["hash"], "abc123");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn contributor_summary_uses_effort_key() {
        let summary = ContributorSummary {
            author: "Ada".to_string(),
            total_effort: 12.5,
            proportion: 0.5,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["effort"], 12.5);
        assert_eq!(json["proportion"], 0.5);
    }
}
