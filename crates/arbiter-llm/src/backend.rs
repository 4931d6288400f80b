//! LLM backend trait and the Gemini implementation.
//! See ARCHITECTURE.md §2
//!
//! Backends:
//!   GeminiBackend — Google Gemini API (gemini-1.5-pro, flash, …)

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
}

// ── Completion ────────────────────────────────────────────────────────────────

/// Result of one primary model call. Token counts are passed through from the
/// provider's usage metadata and stay `None` when the provider omits them;
/// they are never synthesized here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub response_text: String,
    pub model: String,
    pub latency_ms: u64,
    pub tokens_in: Option<u32>,
    pub tokens_out: Option<u32>,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;
    fn model_id(&self) -> &str;
}

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(body)
}

fn parse_gemini_response(json: &serde_json::Value, model: &str, latency_ms: u64) -> Completion {
    Completion {
        response_text: json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: model.to_string(),
        latency_ms,
        tokens_in:  json["usageMetadata"]["promptTokenCount"].as_u64().map(|v| v as u32),
        tokens_out: json["usageMetadata"]["candidatesTokenCount"].as_u64().map(|v| v as u32),
    }
}

// ── Google Gemini ─────────────────────────────────────────────────────────────

pub struct GeminiBackend {
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    /// One `generateContent` call. Latency is wall-clock around the single
    /// network round-trip; no retries.
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let start = Instant::now();
        let resp = self.client.post(&url).json(&body).send().await?;
        let json = check_response_status(resp).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(parse_gemini_response(&json, &self.model, latency_ms))
    }

    fn model_id(&self) -> &str { &self.model }
}

// ── Test support ──────────────────────────────────────────────────────────────


// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_backend_model_id() {
        let b = GeminiBackend::new("AIza-test", "gemini-1.5-pro");
        assert_eq!(b.model_id(), "gemini-1.5-pro");
    }

    #[test]
    fn test_parse_gemini_response_with_usage() {
        let json = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Paris." }] } }],
            "usageMetadata": { "promptTokenCount": 9, "candidatesTokenCount": 3 }
        });
        let c = parse_gemini_response(&json, "gemini-1.5-pro", 120);
        assert_eq!(c.response_text, "Paris.");
        assert_eq!(c.model, "gemini-1.5-pro");
        assert_eq!(c.latency_ms, 120);
        assert_eq!(c.tokens_in, Some(9));
        assert_eq!(c.tokens_out, Some(3));
    }

    #[test]
    fn test_parse_gemini_response_without_usage() {
        let json = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Paris." }] } }]
        });
        let c = parse_gemini_response(&json, "gemini-1.5-pro", 80);
        // Counts the provider did not report must stay absent, not zero.
        assert_eq!(c.tokens_in, None);
        assert_eq!(c.tokens_out, None);
    }

    #[test]
    fn test_parse_gemini_response_missing_candidates() {
        let json = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let c = parse_gemini_response(&json, "gemini-1.5-pro", 50);
        assert_eq!(c.response_text, "");
    }
}
