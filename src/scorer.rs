//! LLM-backed effort scoring.

pub mod ai;
pub mod client;
pub mod error;
pub mod prompts;
#[cfg(test)]
pub(crate) mod test_utils;

pub use ai::gemini::GeminiAiClient;
pub use ai::{AiClient, AiClientMetadata};
pub use client::{create_default_scorer, AiEffortScorer, EffortScorer};
pub use error::ScorerError;
