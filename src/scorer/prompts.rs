//! Prompt templates and response schemas for effort estimation.

use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::data::ScoredCommit;
use crate::git::CommitInfo;

/// System instruction for cold scoring, where no reference commits exist yet.
pub const CALIBRATION_SYSTEM_PROMPT: &str = "Estimate the relative effort for the new commit";

/// System instruction for scoring against already-scored reference commits.
pub const RELATIVE_SYSTEM_PROMPT: &str = "Given a new commit and reference commits with known effort scores, estimate the relative effort for the new commit.
Consider how the complexity and scope of the new commit compares to the reference commits.";

/// Placeholder used when a commit carries no patch.
const NO_PATCH: &str = "No patch available";

/// JSON schema of a single effort judgment.
///
/// The numeric prefixes force the model to produce its reasoning before
/// committing to a score.
pub fn judgment_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "01_reasoning": {
                "type": "STRING",
                "description": "The reasoning behind the analysis"
            },
            "02_description": {
                "type": "STRING",
                "description": "A description of the commit's changes and impact"
            },
            "03_effort": {
                "type": "NUMBER",
                "description": "A numerical score (1-10) representing the effort required"
            }
        },
        "required": ["01_reasoning", "02_description", "03_effort"]
    })
}

/// JSON schema of a cold-scoring answer: one judgment per commit, in order.
pub fn calibration_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": judgment_schema()
    })
}

/// Builds the user prompt for cold scoring of a batch of commits.
pub fn generate_calibration_prompt(commits: &[&CommitInfo]) -> String {
    commits
        .iter()
        .map(|commit| {
            format!(
                "\nCommit Hash: {}\nTitle: {}\nPatch:\n{}\n---\n",
                commit.id,
                commit.title,
                commit.patch.as_deref().unwrap_or(NO_PATCH)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the user prompt for scoring one commit against reference commits.
pub fn generate_relative_prompt(commit: &CommitInfo, references: &[ScoredCommit]) -> String {
    let mut references_text = String::new();
    for reference in references {
        let _ = write!(
            references_text,
            "\nHash: {}\nTitle: {}\nEffort: {}\nDescription: {}\n",
            reference.id, reference.title, reference.effort, reference.description
        );
    }

    format!(
        "Here is the commit to analyze:

Hash: {}
Title: {}
Patch:
{}

Reference commits for effort comparison:
{references_text}

Please analyze this commit relative to the reference commits.",
        commit.id,
        commit.title,
        commit.patch.as_deref().unwrap_or(NO_PATCH)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::scorer::test_utils::{commit_fixture, scored_fixture};

    #[test]
    fn calibration_prompt_lists_every_commit() {
        let a = commit_fixture("aaa", "Ada");
        let mut b = commit_fixture("bbb", "Bob");
        b.patch = None;
        let prompt = generate_calibration_prompt(&[&a, &b]);

        assert!(prompt.contains("Commit Hash: aaa"));
        assert!(prompt.contains("Commit Hash: bbb"));
        assert!(prompt.contains(a.patch.as_deref().unwrap()));
        assert!(prompt.contains(NO_PATCH));
        assert!(prompt.find("aaa").unwrap() < prompt.find("bbb").unwrap());
    }

    #[test]
    fn relative_prompt_includes_reference_scores() {
        let target = commit_fixture("target", "Ada");
        let refs = vec![scored_fixture("r1", 2.0), scored_fixture("r2", 8.0)];
        let prompt = generate_relative_prompt(&target, &refs);

        assert!(prompt.starts_with("Here is the commit to analyze:"));
        assert!(prompt.contains("Hash: target"));
        assert!(prompt.contains("Hash: r1"));
        assert!(prompt.contains("Effort: 2"));
        assert!(prompt.contains("Effort: 8"));
        assert!(prompt.ends_with("Please analyze this commit relative to the reference commits."));
    }

    #[test]
    fn calibration_schema_wraps_judgment_in_array() {
        let schema = calibration_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"], judgment_schema());
        assert_eq!(
            schema["items"]["required"],
            json!(["01_reasoning", "02_description", "03_effort"])
        );
    }
}
