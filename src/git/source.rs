//! Commit sources: where the commit history under analysis comes from.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use git2::build::RepoBuilder;
use git2::{Direction, Remote, Repository, Sort};
use regex::Regex;
use tracing::{debug, info};

use crate::git::CommitInfo;

/// Default host repositories are cloned from.
pub const DEFAULT_BASE_URL: &str = "https://github.com";

/// Default cap on the characters kept from each commit's patch.
pub const DEFAULT_MAX_PATCH_CHARS: usize = 60_000;

/// Produces the commit history of a repository.
pub trait CommitSource: Send + Sync {
    /// Fetches every commit reachable from the default branch, newest first.
    fn fetch_commits<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CommitInfo>>> + Send + 'a>>;
}

/// Clones `{base_url}/{owner}/{repo}.git` into a temporary directory and
/// walks its default branch.
#[derive(Debug, Clone)]
pub struct GitHubCommitSource {
    base_url: String,
    max_patch_chars: usize,
}

impl Default for GitHubCommitSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubCommitSource {
    /// Creates a source pointing at GitHub.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_patch_chars: DEFAULT_MAX_PATCH_CHARS,
        }
    }

    /// Overrides the host. Local paths work as well as URLs.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the per-commit patch size limit.
    pub fn with_max_patch_chars(mut self, max_patch_chars: usize) -> Self {
        self.max_patch_chars = max_patch_chars;
        self
    }

    /// Returns the clone URL for a repository.
    pub fn clone_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/{owner}/{repo}.git", self.base_url)
    }

    /// Returns the web URL commits are linked under.
    pub fn web_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/{owner}/{repo}", self.base_url)
    }
}

impl CommitSource for GitHubCommitSource {
    fn fetch_commits<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CommitInfo>>> + Send + 'a>> {
        Box::pin(async move {
            validate_repo_component("owner", owner)?;
            validate_repo_component("repository", repo)?;

            let clone_url = self.clone_url(owner, repo);
            let web_url = self.web_url(owner, repo);
            let max_patch_chars = self.max_patch_chars;

            info!(url = %clone_url, "Cloning repository");
            let commits = tokio::task::spawn_blocking(move || {
                collect_commits(&clone_url, &web_url, max_patch_chars)
            })
            .await
            .context("Commit extraction task failed")??;

            info!(
                repository = %format!("{owner}/{repo}"),
                commits = commits.len(),
                "Extracted commits"
            );
            Ok(commits)
        })
    }
}

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static REPO_COMPONENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());

/// Rejects owner or repository names that could escape the clone URL.
pub fn validate_repo_component(kind: &str, value: &str) -> Result<()> {
    if value == "." || value == ".." || !REPO_COMPONENT_PATTERN.is_match(value) {
        anyhow::bail!("Invalid {kind} name: {value:?}");
    }
    Ok(())
}

/// Clones the repository and extracts every commit on its default branch.
///
/// The clone lives in a temporary directory that is removed when this
/// function returns, on success or failure.
fn collect_commits(
    clone_url: &str,
    web_url: &str,
    max_patch_chars: usize,
) -> Result<Vec<CommitInfo>> {
    let staging = tempfile::Builder::new()
        .prefix("repo-rank-")
        .tempdir()
        .context("Failed to create staging directory")?;

    let repo = clone_default_branch(clone_url, staging.path())
        .with_context(|| format!("Failed to clone {clone_url}"))?;
    debug!(path = %staging.path().display(), "Clone complete");

    walk_default_branch(&repo, web_url, max_patch_chars)
}

/// Clones only the branch the remote's HEAD points at.
pub(crate) fn clone_default_branch(clone_url: &str, dest: &Path) -> Result<Repository> {
    let branch = remote_default_branch(clone_url)?;
    debug!(branch = %branch, "Cloning single branch");

    let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
    RepoBuilder::new()
        .branch(&branch)
        .remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec))
        .clone(clone_url, dest)
        .context("Failed to fetch default branch")
}

/// Asks the remote which branch its HEAD points at.
fn remote_default_branch(clone_url: &str) -> Result<String> {
    let mut remote = Remote::create_detached(clone_url).context("Invalid remote URL")?;
    remote
        .connect(Direction::Fetch)
        .context("Failed to connect to remote")?;
    let head = remote
        .default_branch()
        .context("Remote has no default branch")?;
    let name = head.as_str().context("Default branch name is not UTF-8")?;
    Ok(name.trim_start_matches("refs/heads/").to_string())
}

/// Walks HEAD newest first, rendering each commit.
pub(crate) fn walk_default_branch(
    repo: &Repository,
    web_url: &str,
    max_patch_chars: usize,
) -> Result<Vec<CommitInfo>> {
    let head = repo.head().context("Repository has no commits")?;
    if !head.is_branch() {
        anyhow::bail!("No default branch found");
    }

    let mut revwalk = repo.revwalk().context("Failed to create revision walker")?;
    revwalk.push_head().context("Failed to start walk at HEAD")?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
        .context("Failed to set walk order")?;

    let mut commits = Vec::new();
    for oid in revwalk {
        let oid = oid.context("Failed to read commit id")?;
        let commit = repo
            .find_commit(oid)
            .with_context(|| format!("Failed to load commit {oid}"))?;
        commits.push(CommitInfo::from_git_commit(
            repo,
            &commit,
            web_url,
            max_patch_chars,
        )?);
    }

    Ok(commits)
}
