//! Request orchestration: validate → primary call → judge → log → reply.
//! See ARCHITECTURE.md §1 and §5

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::audit::RequestLogEvent;
use crate::backend::LlmBackend;
use crate::judge::{Evaluation, JudgeEvaluator};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Client error: the prompt was missing, not a string, or blank.
    #[error("{0}")]
    InvalidPrompt(&'static str),
    /// The primary model call failed. Carries the request id so the error
    /// response stays correlatable with the log line.
    #[error("{message}")]
    Provider { request_id: Uuid, message: String },
}

// ── Wire types ────────────────────────────────────────────────────────────────

/// Inbound body for the gateway endpoint. `prompt` stays a raw JSON value so
/// a non-string prompt is rejected here as a client error instead of dying in
/// the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmApiRequest {
    pub prompt: Option<serde_json::Value>,
    pub user_id: Option<String>,
}

/// Merged response payload: the completion fields plus the evaluation and the
/// request id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmReply {
    pub response_text: String,
    pub model: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u32>,
    pub evaluation: Evaluation,
    pub request_id: Uuid,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn LlmBackend>,
    judge: JudgeEvaluator,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn LlmBackend>, judge: JudgeEvaluator) -> Self {
        Self { backend, judge }
    }

    /// Handle one gateway request end to end. Emits exactly one
    /// `RequestLogEvent` per attempt that passes validation, success or error.
    pub async fn handle(&self, req: LlmApiRequest) -> Result<LlmReply, GatewayError> {
        let request_id = Uuid::new_v4();
        let timestamp = Utc::now();

        let prompt = match req.prompt.as_ref().and_then(serde_json::Value::as_str) {
            Some(p) if !p.trim().is_empty() => p,
            _ => {
                return Err(GatewayError::InvalidPrompt(
                    "Missing or invalid 'prompt' in request body.",
                ))
            }
        };

        let completion = match self.backend.complete(prompt).await {
            Ok(c) => c,
            Err(err) => {
                let message = err.to_string();
                RequestLogEvent::error(
                    request_id,
                    req.user_id,
                    timestamp,
                    prompt,
                    self.backend.model_id(),
                    &message,
                )
                .emit();
                return Err(GatewayError::Provider { request_id, message });
            }
        };

        // Cannot fail: any judge-side problem becomes the neutral default.
        let evaluation = self.judge.evaluate(prompt, &completion.response_text).await;

        RequestLogEvent::success(
            request_id,
            req.user_id,
            timestamp,
            prompt,
            &completion,
            evaluation.clone(),
        )
        .emit();

        Ok(LlmReply {
            response_text: completion.response_text,
            model: completion.model,
            latency_ms: completion.latency_ms,
            tokens_in: completion.tokens_in,
            tokens_out: completion.tokens_out,
            evaluation,
            request_id,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::ScriptedBackend;

    fn orchestrator_with(backend: Arc<ScriptedBackend>) -> Orchestrator {
        let judge = JudgeEvaluator::new(backend.clone() as Arc<dyn LlmBackend>);
        Orchestrator::new(backend, judge)
    }

    fn request(prompt: serde_json::Value) -> LlmApiRequest {
        LlmApiRequest { prompt: Some(prompt), user_id: None }
    }

    #[tokio::test]
    async fn test_missing_prompt_is_rejected_without_model_call() {
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let orch = orchestrator_with(backend.clone());

        let result = orch.handle(LlmApiRequest::default()).await;
        assert!(matches!(result, Err(GatewayError::InvalidPrompt(_))));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected_without_model_call() {
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let orch = orchestrator_with(backend.clone());

        let result = orch.handle(request(serde_json::json!("   "))).await;
        assert!(matches!(result, Err(GatewayError::InvalidPrompt(_))));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_string_prompt_is_rejected() {
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let orch = orchestrator_with(backend.clone());

        let result = orch.handle(request(serde_json::json!(42))).await;
        assert!(matches!(result, Err(GatewayError::InvalidPrompt(_))));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_carries_request_id_and_skips_judge() {
        let backend = Arc::new(ScriptedBackend::failing());
        let orch = orchestrator_with(backend.clone());

        let result = orch.handle(request(serde_json::json!("hello"))).await;
        match result {
            Err(GatewayError::Provider { message, .. }) => {
                assert!(message.contains("scripted backend failure"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
        // Only the failed primary call went out; no judge attempt followed.
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_success_merges_completion_and_default_evaluation() {
        // The scripted reply is prose, so the judge pass (second call to the
        // same backend) degrades to the neutral default.
        let backend = Arc::new(ScriptedBackend::replying("Paris is the capital of France."));
        let orch = orchestrator_with(backend.clone());

        let reply = orch
            .handle(request(serde_json::json!("capital of france?")))
            .await
            .unwrap();

        assert_eq!(reply.response_text, "Paris is the capital of France.");
        assert_eq!(reply.model, "scripted-model");
        assert_eq!(reply.latency_ms, 7);
        assert_eq!(reply.tokens_in, Some(12));
        assert_eq!(reply.tokens_out, Some(34));
        assert_eq!(reply.evaluation, Evaluation::default());
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_success_reply_serializes_camel_case() {
        let backend = Arc::new(ScriptedBackend::replying("ok"));
        let orch = orchestrator_with(backend);

        let reply = orch.handle(request(serde_json::json!("hi"))).await.unwrap();
        let json = serde_json::to_value(&reply).unwrap();

        assert!(json.get("responseText").is_some());
        assert!(json.get("latencyMs").is_some());
        assert!(json.get("requestId").is_some());
        assert!(json["evaluation"].get("hallucinationSuspected").is_some());
    }
}
