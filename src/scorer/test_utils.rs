//! Shared test utilities for the `scorer`, `analysis` and `server` modules.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::{TimeZone, Utc};

use crate::data::ScoredCommit;
use crate::git::{CommitInfo, CommitSource};
use crate::scorer::ai::{AiClient, AiClientMetadata};
use crate::scorer::client::{EffortScorer, ScoreFuture};
use crate::scorer::error::ScorerError;

/// Builds a commit with a small patch.
pub(crate) fn commit_fixture(id: &str, author: &str) -> CommitInfo {
    CommitInfo {
        id: id.to_string(),
        title: format!("change {id}"),
        author: author.to_string(),
        timestamp: Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .unwrap()
            .fixed_offset(),
        patch: Some(format!("--- a/{id}.rs\n+++ b/{id}.rs\n+fn {id}() {{}}\n")),
        url: format!("https://github.com/octo/repo/commit/{id}"),
    }
}

/// Builds a scored commit with the given effort.
pub(crate) fn scored_fixture(id: &str, effort: f64) -> ScoredCommit {
    ScoredCommit {
        id: id.to_string(),
        title: format!("change {id}"),
        reasoning: "fixture".to_string(),
        description: format!("description of {id}"),
        effort,
    }
}

/// Recorded `(system_prompt, user_prompt, response_schema)` triple.
pub(crate) type RecordedPrompt = (String, String, serde_json::Value);

/// Mock AI client with a pre-programmed queue of responses.
///
/// Responses are returned in FIFO order. When the queue is exhausted,
/// subsequent calls return `Err("no more mock responses")`.
pub(crate) struct ConfigurableMockAiClient {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    metadata: AiClientMetadata,
    recorded_prompts: Arc<Mutex<Vec<RecordedPrompt>>>,
}

impl ConfigurableMockAiClient {
    /// Creates a new mock client that will return the given responses in order.
    pub(crate) fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            metadata: AiClientMetadata {
                provider: "Mock".to_string(),
                model: "mock-model".to_string(),
                max_response_length: 8_192,
            },
            recorded_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a handle for inspecting which prompts were sent after the
    /// client has been moved into an [`AiEffortScorer`](super::AiEffortScorer).
    pub(crate) fn prompt_handle(&self) -> PromptRecordHandle {
        PromptRecordHandle {
            recorded_prompts: self.recorded_prompts.clone(),
        }
    }
}

/// Shared handle to a mock client's recorded prompts.
pub(crate) struct PromptRecordHandle {
    recorded_prompts: Arc<Mutex<Vec<RecordedPrompt>>>,
}

impl PromptRecordHandle {
    /// Returns every recorded request.
    pub(crate) fn prompts(&self) -> Vec<RecordedPrompt> {
        self.recorded_prompts.lock().unwrap().clone()
    }

    /// Returns the number of AI requests that were made.
    pub(crate) fn request_count(&self) -> usize {
        self.recorded_prompts.lock().unwrap().len()
    }
}

impl AiClient for ConfigurableMockAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
        response_schema: &'a serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let responses = self.responses.clone();
        let recorded = self.recorded_prompts.clone();
        let entry = (
            system_prompt.to_string(),
            user_prompt.to_string(),
            response_schema.clone(),
        );
        Box::pin(async move {
            recorded.lock().unwrap().push(entry);
            responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no more mock responses")))
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        self.metadata.clone()
    }
}

/// Calls observed by a [`MockEffortScorer`].
#[derive(Debug, Default, Clone)]
pub(crate) struct ScorerCalls {
    /// Commit ids of each cold-scoring call.
    pub cold: Vec<Vec<String>>,
    /// `(target id, reference ids)` of each relative-scoring call.
    pub relative: Vec<(String, Vec<String>)>,
    /// Relative-scoring calls currently running.
    pub in_flight: usize,
    /// Highest value `in_flight` reached.
    pub max_in_flight: usize,
}

/// Scripted [`EffortScorer`] that records every call.
///
/// Efforts default to `default_effort` and can be overridden per commit id.
pub(crate) struct MockEffortScorer {
    efforts: HashMap<String, f64>,
    default_effort: f64,
    fail_cold: bool,
    failing_commits: HashSet<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<ScorerCalls>>,
}

impl MockEffortScorer {
    pub(crate) fn new() -> Self {
        Self {
            efforts: HashMap::new(),
            default_effort: 5.0,
            fail_cold: false,
            failing_commits: HashSet::new(),
            delay: None,
            calls: Arc::new(Mutex::new(ScorerCalls::default())),
        }
    }

    pub(crate) fn with_effort(mut self, id: &str, effort: f64) -> Self {
        self.efforts.insert(id.to_string(), effort);
        self
    }

    pub(crate) fn with_default_effort(mut self, effort: f64) -> Self {
        self.default_effort = effort;
        self
    }

    /// Makes every cold-scoring call fail.
    pub(crate) fn failing_cold(mut self) -> Self {
        self.fail_cold = true;
        self
    }

    /// Makes relative scoring of `id` fail.
    pub(crate) fn failing_commit(mut self, id: &str) -> Self {
        self.failing_commits.insert(id.to_string());
        self
    }

    /// Delays every relative-scoring call.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn call_handle(&self) -> Arc<Mutex<ScorerCalls>> {
        self.calls.clone()
    }

    fn judge(&self, commit: &CommitInfo) -> ScoredCommit {
        let effort = self
            .efforts
            .get(&commit.id)
            .copied()
            .unwrap_or(self.default_effort);
        ScoredCommit {
            id: commit.id.clone(),
            title: commit.title.clone(),
            reasoning: "mock".to_string(),
            description: format!("mock description of {}", commit.id),
            effort,
        }
    }
}

impl EffortScorer for MockEffortScorer {
    fn score<'a>(&'a self, commits: &'a [&'a CommitInfo]) -> ScoreFuture<'a, Vec<ScoredCommit>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .cold
                .push(commits.iter().map(|c| c.id.clone()).collect());
            if self.fail_cold {
                return Err(ScorerError::ApiRequestFailed("calibration down".to_string()));
            }
            Ok(commits.iter().map(|c| self.judge(c)).collect())
        })
    }

    fn score_with_references<'a>(
        &'a self,
        commit: &'a CommitInfo,
        references: &'a [ScoredCommit],
    ) -> ScoreFuture<'a, ScoredCommit> {
        Box::pin(async move {
            {
                let mut calls = self.calls.lock().unwrap();
                calls.relative.push((
                    commit.id.clone(),
                    references.iter().map(|r| r.id.clone()).collect(),
                ));
                calls.in_flight += 1;
                calls.max_in_flight = calls.max_in_flight.max(calls.in_flight);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().in_flight -= 1;
            if self.failing_commits.contains(&commit.id) {
                return Err(ScorerError::MalformedOutput(format!(
                    "unparseable answer for {}",
                    commit.id
                )));
            }
            Ok(self.judge(commit))
        })
    }
}

/// [`CommitSource`] serving a fixed history, or failing every fetch.
pub(crate) struct StaticCommitSource {
    commits: Option<Vec<CommitInfo>>,
}

impl StaticCommitSource {
    pub(crate) fn new(commits: Vec<CommitInfo>) -> Self {
        Self {
            commits: Some(commits),
        }
    }

    pub(crate) fn unavailable() -> Self {
        Self { commits: None }
    }
}

impl CommitSource for StaticCommitSource {
    fn fetch_commits<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CommitInfo>>> + Send + 'a>> {
        Box::pin(async move {
            self.commits
                .clone()
                .ok_or_else(|| anyhow::anyhow!("repository {owner}/{repo} not found"))
        })
    }
}
