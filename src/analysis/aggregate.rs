//! Result merging and per-contributor rollup.

use std::collections::HashMap;

use crate::data::{ContributorSummary, ScoredCommit};
use crate::git::CommitInfo;

/// Per-contributor effort totals for one repository.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributorBreakdown {
    /// Sum of every scored commit's effort.
    pub total_effort: f64,
    /// Contributors ordered by descending effort.
    pub contributors: Vec<ContributorSummary>,
}

/// Concatenates calibration results with phase-two results.
pub fn merge(calibrated: Vec<ScoredCommit>, relative: Vec<ScoredCommit>) -> Vec<ScoredCommit> {
    let mut merged = calibrated;
    merged.extend(relative);
    merged
}

/// Sums effort per author.
///
/// Authors are looked up by commit id; scored commits without a matching
/// commit are ignored. Ties keep first-seen order.
pub fn summarize_contributors(
    analyses: &[ScoredCommit],
    commits: &[CommitInfo],
) -> ContributorBreakdown {
    let authors: HashMap<&str, &str> = commits
        .iter()
        .map(|commit| (commit.id.as_str(), commit.author.as_str()))
        .collect();

    let mut contributors: Vec<ContributorSummary> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut total_effort = 0.0;

    for analysis in analyses {
        let Some(&author) = authors.get(analysis.id.as_str()) else {
            continue;
        };
        total_effort += analysis.effort;

        let position = *positions.entry(author).or_insert_with(|| {
            contributors.push(ContributorSummary {
                author: author.to_string(),
                total_effort: 0.0,
                proportion: 0.0,
            });
            contributors.len() - 1
        });
        contributors[position].total_effort += analysis.effort;
    }

    for contributor in &mut contributors {
        contributor.proportion = if total_effort > 0.0 {
            contributor.total_effort / total_effort
        } else {
            0.0
        };
    }
    contributors.sort_by(|a, b| b.total_effort.total_cmp(&a.total_effort));

    ContributorBreakdown {
        total_effort,
        contributors,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::scorer::test_utils::{commit_fixture, scored_fixture};

    #[test]
    fn merge_keeps_calibration_first() {
        let merged = merge(
            vec![scored_fixture("a", 1.0)],
            vec![scored_fixture("b", 2.0), scored_fixture("c", 3.0)],
        );
        let ids: Vec<&str> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn groups_by_author_and_sorts_descending() {
        let commits = vec![
            commit_fixture("c1", "A"),
            commit_fixture("c2", "B"),
            commit_fixture("c3", "A"),
        ];
        let analyses = vec![
            scored_fixture("c1", 2.0),
            scored_fixture("c2", 6.0),
            scored_fixture("c3", 2.0),
        ];

        let breakdown = summarize_contributors(&analyses, &commits);

        assert_eq!(breakdown.total_effort, 10.0);
        assert_eq!(breakdown.contributors.len(), 2);
        assert_eq!(breakdown.contributors[0].author, "B");
        assert_eq!(breakdown.contributors[0].total_effort, 6.0);
        assert!((breakdown.contributors[0].proportion - 0.6).abs() < 1e-9);
        assert_eq!(breakdown.contributors[1].author, "A");
        assert_eq!(breakdown.contributors[1].total_effort, 4.0);
        assert!((breakdown.contributors[1].proportion - 0.4).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let commits = vec![commit_fixture("c1", "Zed"), commit_fixture("c2", "Amy")];
        let analyses = vec![scored_fixture("c1", 3.0), scored_fixture("c2", 3.0)];

        let breakdown = summarize_contributors(&analyses, &commits);
        let authors: Vec<&str> = breakdown
            .contributors
            .iter()
            .map(|c| c.author.as_str())
            .collect();
        assert_eq!(authors, vec!["Zed", "Amy"]);
    }

    #[test]
    fn nothing_scored_yields_empty_breakdown() {
        let commits = vec![commit_fixture("c1", "A")];
        let breakdown = summarize_contributors(&[], &commits);
        assert_eq!(breakdown.total_effort, 0.0);
        assert!(breakdown.contributors.is_empty());
    }

    #[test]
    fn zero_total_gives_zero_proportions() {
        let commits = vec![commit_fixture("c1", "A")];
        let breakdown = summarize_contributors(&[scored_fixture("c1", 0.0)], &commits);
        assert_eq!(breakdown.contributors[0].proportion, 0.0);
    }

    #[test]
    fn unknown_commit_ids_are_ignored() {
        let commits = vec![commit_fixture("c1", "A")];
        let analyses = vec![scored_fixture("c1", 4.0), scored_fixture("ghost", 9.0)];
        let breakdown = summarize_contributors(&analyses, &commits);
        assert_eq!(breakdown.total_effort, 4.0);
        assert_eq!(breakdown.contributors.len(), 1);
    }

    proptest! {
        #[test]
        fn totals_and_proportions_are_consistent(
            entries in prop::collection::vec((0usize..5, 1.0f64..10.0), 1..40),
        ) {
            let commits: Vec<CommitInfo> = entries
                .iter()
                .enumerate()
                .map(|(i, (author, _))| commit_fixture(&format!("c{i}"), &format!("author{author}")))
                .collect();
            let analyses: Vec<ScoredCommit> = entries
                .iter()
                .enumerate()
                .map(|(i, (_, effort))| scored_fixture(&format!("c{i}"), *effort))
                .collect();

            let breakdown = summarize_contributors(&analyses, &commits);

            let expected_total: f64 = entries.iter().map(|(_, e)| e).sum();
            prop_assert!((breakdown.total_effort - expected_total).abs() < 1e-9);

            let summed: f64 = breakdown.contributors.iter().map(|c| c.total_effort).sum();
            prop_assert!((summed - breakdown.total_effort).abs() < 1e-9);

            let proportions: f64 = breakdown.contributors.iter().map(|c| c.proportion).sum();
            prop_assert!((proportions - 1.0).abs() < 1e-9);

            for pair in breakdown.contributors.windows(2) {
                prop_assert!(pair[0].total_effort >= pair[1].total_effort);
            }
        }
    }
}
