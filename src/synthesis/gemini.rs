//! Gemini REST generator.
//!
//! Thin `reqwest` client for the `generateContent` endpoint. Each call owns
//! its request end-to-end; nothing is held across orchestration states. The
//! per-request credential (if the caller supplied one) takes precedence over
//! the configured key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenerationError, Generator};
use crate::config::SynthesisConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

pub struct GeminiGenerator {
    client: reqwest::Client,
    model: String,
    configured_key: String,
}

impl GeminiGenerator {
    pub fn new(config: &SynthesisConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            model: config.gemini_model.clone(),
            configured_key: config.gemini_api_key.clone(),
        })
    }

    fn resolve_key<'a>(&'a self, credential: Option<&'a str>) -> Option<&'a str> {
        credential
            .filter(|k| !k.is_empty())
            .or_else(|| (!self.configured_key.is_empty()).then_some(self.configured_key.as_str()))
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn complete(
        &self,
        prompt: &str,
        credential: Option<&str>,
    ) -> Result<String, GenerationError> {
        let key = self
            .resolve_key(credential)
            .ok_or(GenerationError::MissingCredential)?;

        let url = format!("{GEMINI_BASE_URL}/{}:generateContent", self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::Api {
                status: response.status().as_u16(),
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        extract_text(parsed)
    }
}

/// Join all candidate part texts; an answer-free response is an error so the
/// synthesizer falls back instead of returning a blank draft.
fn extract_text(response: GenerateResponse) -> Result<String, GenerationError> {
    let text: String = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        Err(GenerationError::EmptyCompletion)
    } else {
        Ok(text)
    }
}
