//! Runtime configuration for the analysis workflow, the scorer and the server.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::AnalysisError;
use crate::scorer::ai::REQUEST_TIMEOUT;
use crate::scorer::ScorerError;
use crate::utils::settings::{get_env_var, get_env_vars};

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// What to do when a single commit in a batch cannot be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FailurePolicy {
    /// Fail the whole analysis.
    #[default]
    FailRequest,
    /// Drop the commit from the results and continue.
    SkipCommit,
}

/// Tuning knobs for the two-phase estimation workflow.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Number of commits scored cold to form the reference set.
    pub sample_size: usize,
    /// Number of references drawn for each remaining commit.
    pub reference_sample_size: usize,
    /// Number of commits dispatched together in phase two.
    pub batch_size: usize,
    /// Upper bound on phase-two batches in flight at once.
    pub max_concurrent_batches: usize,
    /// Deadline for a single scorer call.
    pub scoring_timeout: Duration,
    /// Seed for reproducible sampling; entropy when `None`.
    pub seed: Option<u64>,
    /// Per-commit failure handling in phase two.
    pub failure_policy: FailurePolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_size: 5,
            reference_sample_size: 4,
            batch_size: 10,
            max_concurrent_batches: 4,
            scoring_timeout: Duration::from_secs(120),
            seed: None,
            failure_policy: FailurePolicy::FailRequest,
        }
    }
}

impl AnalysisConfig {
    /// Rejects settings the workflow cannot run with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let zero = [
            ("sample_size", self.sample_size),
            ("batch_size", self.batch_size),
            ("max_concurrent_batches", self.max_concurrent_batches),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);

        if let Some((name, _)) = zero {
            return Err(AnalysisError::InvalidConfig(format!(
                "{name} must be at least 1"
            )));
        }
        if self.scoring_timeout.is_zero() {
            return Err(AnalysisError::InvalidConfig(
                "scoring_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the random generator for one analysis run.
    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Connection and sampling settings for the Gemini backend.
#[derive(Clone)]
pub struct ScorerConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// API base URL.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Maximum tokens in one answer.
    pub max_output_tokens: u32,
    /// HTTP-level timeout for one request.
    pub request_timeout: Duration,
}

impl fmt::Debug for ScorerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScorerConfig")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ScorerConfig {
    /// Creates a configuration with default model and sampling settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Reads the configuration from the environment, falling back to
    /// `~/.repo-rank/settings.json`.
    ///
    /// `GEMINI_API_KEY` is required; `REPO_RANK_MODEL` or `GEMINI_MODEL`
    /// overrides the model and `GEMINI_BASE_URL` the endpoint.
    pub fn from_env() -> Result<Self> {
        let api_key = get_env_var("GEMINI_API_KEY").map_err(|_| ScorerError::ApiKeyNotFound)?;
        let mut config = Self::new(api_key);

        if let Ok(model) = get_env_vars(&["REPO_RANK_MODEL", "GEMINI_MODEL"]) {
            config.model = model;
        }
        if let Ok(base_url) = get_env_var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }

        Ok(config)
    }

    /// Overrides the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind: String,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.bind, self.port))
    }
}
