//! Structured request log events.
//! See ARCHITECTURE.md §4

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::Completion;
use crate::judge::Evaluation;

/// Caps applied to logged text so one request cannot blow up log volume.
pub const PROMPT_LOG_CAP: usize = 300;
pub const RESPONSE_LOG_CAP: usize = 500;

/// One write-once log line per request attempt. Emitted to the process log
/// stream, never read back by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogEvent {
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub prompt: String,
    pub response_text: String,
    pub model: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u32>,
    pub status: String,
    pub evaluation: Evaluation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RequestLogEvent {
    pub fn success(
        request_id: Uuid,
        user_id: Option<String>,
        timestamp: DateTime<Utc>,
        prompt: &str,
        completion: &Completion,
        evaluation: Evaluation,
    ) -> Self {
        Self {
            event_type: "llm_request".to_string(),
            timestamp,
            request_id,
            user_id,
            prompt: truncate(prompt, PROMPT_LOG_CAP),
            response_text: truncate(&completion.response_text, RESPONSE_LOG_CAP),
            model: completion.model.clone(),
            latency_ms: completion.latency_ms,
            tokens_in: completion.tokens_in,
            tokens_out: completion.tokens_out,
            status: "success".to_string(),
            evaluation,
            error_message: None,
        }
    }

    /// The primary call never completed: latency is reported as 0 and the
    /// evaluation slot carries the neutral default.
    pub fn error(
        request_id: Uuid,
        user_id: Option<String>,
        timestamp: DateTime<Utc>,
        prompt: &str,
        model: &str,
        error_message: &str,
    ) -> Self {
        Self {
            event_type: "llm_request".to_string(),
            timestamp,
            request_id,
            user_id,
            prompt: truncate(prompt, PROMPT_LOG_CAP),
            response_text: String::new(),
            model: model.to_string(),
            latency_ms: 0,
            tokens_in: None,
            tokens_out: None,
            status: "error".to_string(),
            evaluation: Evaluation::default(),
            error_message: Some(error_message.to_string()),
        }
    }

    /// Write the event as one JSON line through the process log stream.
    /// Fire-and-forget: this can never fail or block the request.
    pub fn emit(&self) {
        if let Ok(line) = serde_json::to_string(self) {
            tracing::info!(target: "arbiter::audit", "{line}");
        }
    }
}

/// Truncate to `max_len` characters, appending `"..."` only when something
/// was actually cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let mut out: String = s.chars().take(max_len).collect();
        out.push_str("...");
        out
    } else {
        s.to_string()
    }
}
