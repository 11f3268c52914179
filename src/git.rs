//! Git operations: cloning repositories and extracting commits with patches.

pub mod commit;
pub mod source;

pub use commit::CommitInfo;
pub use source::{CommitSource, GitHubCommitSource};

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
