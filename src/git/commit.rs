//! Git commit extraction.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{Commit, Diff, Repository};
use serde::{Deserialize, Serialize};

use crate::git::SHORT_HASH_LEN;

/// Patch text used when a commit changes no files.
pub const EMPTY_COMMIT_PATCH: &str = "No changes (empty commit)";

/// Marker appended to patches cut at the size limit.
pub const TRUNCATION_MARKER: &str = "\n... [patch truncated]\n";

/// Commit information structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full SHA-1 hash of the commit.
    #[serde(rename = "hash")]
    pub id: String,
    /// First line of the commit message.
    pub title: String,
    /// Commit author name.
    pub author: String,
    /// Author date with its original timezone offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Unified patch against the first parent, if one could be rendered.
    pub patch: Option<String>,
    /// Web URL of the commit.
    pub url: String,
}

impl CommitInfo {
    /// Creates `CommitInfo` from a `git2::Commit`.
    ///
    /// `commit_base_url` is the web location of the repository; the commit
    /// URL is `{commit_base_url}/commit/{hash}`. Patches longer than
    /// `max_patch_chars` are truncated.
    pub fn from_git_commit(
        repo: &Repository,
        commit: &Commit,
        commit_base_url: &str,
        max_patch_chars: usize,
    ) -> Result<Self> {
        let id = commit.id().to_string();

        let author = commit.author().name().unwrap_or("Unknown").to_string();

        let when = commit.author().when();
        let offset =
            FixedOffset::east_opt(when.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
        let timestamp = DateTime::from_timestamp(when.seconds(), 0)
            .context("Invalid commit timestamp")?
            .with_timezone(&offset);

        let title = commit
            .message()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .to_string();

        let patch = match render_patch(repo, commit) {
            Ok(patch) => Some(truncate_patch(patch, max_patch_chars)),
            Err(e) => {
                tracing::warn!(commit = %id, "Failed to render patch: {e:#}");
                None
            }
        };

        let url = format!("{}/commit/{id}", commit_base_url.trim_end_matches('/'));

        Ok(Self {
            id,
            title,
            author,
            timestamp,
            patch,
            url,
        })
    }

    /// Returns the abbreviated hash.
    pub fn short_hash(&self) -> &str {
        let end = self.id.len().min(SHORT_HASH_LEN);
        &self.id[..end]
    }
}

/// Diffs a commit against its first parent, or the empty tree for a root commit.
fn diff_against_parent<'r>(repo: &'r Repository, commit: &Commit) -> Result<Diff<'r>> {
    let commit_tree = commit.tree().context("Failed to get commit tree")?;

    let parent_tree = if commit.parent_count() > 0 {
        Some(
            commit
                .parent(0)
                .context("Failed to get parent commit")?
                .tree()
                .context("Failed to get parent tree")?,
        )
    } else {
        None
    };

    repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)
        .context("Failed to create diff")
}

/// Renders the unified patch for a commit.
pub(crate) fn render_patch(repo: &Repository, commit: &Commit) -> Result<String> {
    let diff = diff_against_parent(repo, commit)?;

    if diff.deltas().count() == 0 {
        return Ok(EMPTY_COMMIT_PATCH.to_string());
    }

    let mut patch = String::new();
    diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
        let content = String::from_utf8_lossy(line.content());
        match line.origin() {
            '+' | '-' | ' ' => patch.push(line.origin()),
            _ => {}
        }
        patch.push_str(&content);
        true
    })
    .context("Failed to format diff")?;

    Ok(patch)
}

/// Cuts a patch to at most `max_chars` characters, appending a marker.
pub(crate) fn truncate_patch(patch: String, max_chars: usize) -> String {
    match patch.char_indices().nth(max_chars) {
        None => patch,
        Some((byte_idx, _)) => {
            let mut truncated = patch[..byte_idx].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
    }
}
