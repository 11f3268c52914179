//! Effort scorer: turns commits into structured effort judgments.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ScorerConfig;
use crate::data::{ScoredCommit, MAX_EFFORT, MIN_EFFORT};
use crate::git::CommitInfo;
use crate::scorer::ai::{AiClient, AiClientMetadata};
use crate::scorer::error::ScorerError;
use crate::scorer::{prompts, GeminiAiClient};

/// Boxed future returned by [`EffortScorer`] methods.
pub type ScoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ScorerError>> + Send + 'a>>;

/// Scores commits for implementation effort.
pub trait EffortScorer: Send + Sync {
    /// Scores a batch of commits without any reference points.
    ///
    /// Returns exactly one judgment per input commit, in input order.
    fn score<'a>(&'a self, commits: &'a [&'a CommitInfo]) -> ScoreFuture<'a, Vec<ScoredCommit>>;

    /// Scores one commit relative to already-scored reference commits.
    fn score_with_references<'a>(
        &'a self,
        commit: &'a CommitInfo,
        references: &'a [ScoredCommit],
    ) -> ScoreFuture<'a, ScoredCommit>;
}

/// Judgment as the model returns it.
#[derive(Debug, Deserialize)]
struct RawJudgment {
    #[serde(rename = "01_reasoning")]
    reasoning: String,
    #[serde(rename = "02_description")]
    description: String,
    #[serde(rename = "03_effort")]
    effort: f64,
}

/// Cold batch answers are arrays; a lone object is accepted for one commit.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBatch {
    Many(Vec<RawJudgment>),
    One(RawJudgment),
}

/// [`EffortScorer`] backed by an [`AiClient`].
pub struct AiEffortScorer {
    ai_client: Box<dyn AiClient>,
}

impl AiEffortScorer {
    /// Creates a new scorer with the given AI client.
    pub fn new(ai_client: Box<dyn AiClient>) -> Self {
        Self { ai_client }
    }

    /// Returns metadata about the underlying AI client.
    pub fn get_ai_client_metadata(&self) -> AiClientMetadata {
        self.ai_client.get_metadata()
    }

    async fn score_cold(&self, commits: &[&CommitInfo]) -> Result<Vec<ScoredCommit>, ScorerError> {
        if commits.is_empty() {
            return Ok(Vec::new());
        }

        info!(commits = commits.len(), "Scoring commits without references");
        let user_prompt = prompts::generate_calibration_prompt(commits);
        let schema = prompts::calibration_schema();

        let content = self
            .ai_client
            .send_request(prompts::CALIBRATION_SYSTEM_PROMPT, &user_prompt, &schema)
            .await
            .map_err(ScorerError::from_client_error)?;

        let judgments = match parse_json::<RawBatch>(&content)? {
            RawBatch::Many(judgments) => judgments,
            RawBatch::One(judgment) => vec![judgment],
        };

        if judgments.len() != commits.len() {
            return Err(ScorerError::MalformedOutput(format!(
                "expected {} judgments, got {}",
                commits.len(),
                judgments.len()
            )));
        }

        commits
            .iter()
            .zip(judgments)
            .map(|(commit, raw)| into_scored(commit, raw))
            .collect()
    }

    async fn score_relative(
        &self,
        commit: &CommitInfo,
        references: &[ScoredCommit],
    ) -> Result<ScoredCommit, ScorerError> {
        debug!(
            commit = %commit.short_hash(),
            references = references.len(),
            "Scoring commit with references"
        );
        let user_prompt = prompts::generate_relative_prompt(commit, references);
        let schema = prompts::judgment_schema();

        let content = self
            .ai_client
            .send_request(prompts::RELATIVE_SYSTEM_PROMPT, &user_prompt, &schema)
            .await
            .map_err(ScorerError::from_client_error)?;

        let raw: RawJudgment = parse_json(&content)?;
        into_scored(commit, raw)
    }
}

impl EffortScorer for AiEffortScorer {
    fn score<'a>(&'a self, commits: &'a [&'a CommitInfo]) -> ScoreFuture<'a, Vec<ScoredCommit>> {
        Box::pin(self.score_cold(commits))
    }

    fn score_with_references<'a>(
        &'a self,
        commit: &'a CommitInfo,
        references: &'a [ScoredCommit],
    ) -> ScoreFuture<'a, ScoredCommit> {
        Box::pin(self.score_relative(commit, references))
    }
}

/// Extracts the JSON payload, tolerating a surrounding markdown code fence.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.split("```").next().unwrap_or(rest).trim()
    } else {
        trimmed
    }
}

fn parse_json<T: for<'de> Deserialize<'de>>(content: &str) -> Result<T, ScorerError> {
    serde_json::from_str(extract_json(content)).map_err(|e| {
        debug!(response_content = %content, "Failed to parse effort judgment");
        ScorerError::MalformedOutput(e.to_string())
    })
}

/// Validates a raw judgment and attaches the commit's identity.
fn into_scored(commit: &CommitInfo, raw: RawJudgment) -> Result<ScoredCommit, ScorerError> {
    if !raw.effort.is_finite() {
        return Err(ScorerError::MalformedOutput(format!(
            "effort for {} is not a finite number",
            commit.short_hash()
        )));
    }

    let effort = raw.effort.clamp(MIN_EFFORT, MAX_EFFORT);
    if (effort - raw.effort).abs() > f64::EPSILON {
        warn!(
            commit = %commit.short_hash(),
            effort = raw.effort,
            "Effort outside [{MIN_EFFORT}, {MAX_EFFORT}], clamping"
        );
    }

    Ok(ScoredCommit {
        id: commit.id.clone(),
        title: commit.title.clone(),
        reasoning: raw.reasoning,
        description: raw.description,
        effort,
    })
}

/// Creates the default Gemini-backed scorer.
pub fn create_default_scorer(config: &ScorerConfig) -> Result<AiEffortScorer> {
    let ai_client = GeminiAiClient::new(config)?;
    Ok(AiEffortScorer::new(Box::new(ai_client)))
}
