//! Google Gemini API client implementation.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AiClient, AiClientMetadata};
use crate::config::ScorerConfig;
use crate::scorer::error::ScorerError;

/// A single text part of a message.
#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Gemini request content block.
#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

/// Sampling and structured-output settings.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
    response_schema: &'a serde_json::Value,
}

/// Gemini `generateContent` request body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

/// Gemini `generateContent` response.
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Gemini API client implementation.
pub struct GeminiAiClient {
    /// HTTP client for API requests.
    client: Client,
    /// API key for authentication.
    api_key: String,
    /// Model identifier.
    model: String,
    /// API base URL, without trailing slash.
    base_url: String,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl GeminiAiClient {
    /// Creates a new Gemini client from scorer configuration.
    pub fn new(config: &ScorerConfig) -> Result<Self> {
        let client = super::build_http_client(config.request_timeout)?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
        })
    }

    /// Returns the `generateContent` endpoint for the configured model.
    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl AiClient for GeminiAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
        response_schema: &'a serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            debug!(
                system_prompt_len = system_prompt.len(),
                user_prompt_len = user_prompt.len(),
                model = %self.model,
                "Preparing Gemini API request"
            );

            debug!(
                system_prompt = %system_prompt,
                user_prompt = %user_prompt,
                "Gemini API request content"
            );

            let request = GenerateContentRequest {
                system_instruction: Content {
                    role: None,
                    parts: vec![Part {
                        text: system_prompt,
                    }],
                },
                contents: vec![Content {
                    role: Some("user"),
                    parts: vec![Part { text: user_prompt }],
                }],
                generation_config: GenerationConfig {
                    temperature: self.temperature,
                    top_p: self.top_p,
                    top_k: self.top_k,
                    max_output_tokens: self.max_output_tokens,
                    response_mime_type: "application/json",
                    response_schema,
                },
            };

            let url = self.api_url();
            info!(url = %url, model = %self.model, "Sending request to Gemini API");

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| ScorerError::NetworkError(e.to_string()))?;

            let response = super::check_error_response(response).await?;

            let body: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| ScorerError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                candidate_count = body.candidates.len(),
                "Received Gemini API response"
            );

            let candidate = body.candidates.into_iter().next().ok_or_else(|| {
                ScorerError::InvalidResponseFormat("No candidates in response".to_string())
            })?;

            let text: String = candidate
                .content
                .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
                .unwrap_or_default();

            let result = if text.is_empty() {
                Err(ScorerError::InvalidResponseFormat(format!(
                    "No text content in response (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ))
                .into())
            } else {
                Ok(text)
            };

            super::log_response_success("Gemini", &result);
            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        AiClientMetadata {
            provider: "Google".to_string(),
            model: self.model.clone(),
            max_response_length: self.max_output_tokens as usize,
        }
    }
}
