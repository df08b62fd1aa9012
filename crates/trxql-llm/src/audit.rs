//! Audit records for completion calls.
//!
//! The completion text itself is never logged, only its SHA-256.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

use crate::backend::LlmResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionAudit {
    pub id: Uuid,
    /// `generate` or `analyze`.
    pub purpose: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

pub fn output_hash(output: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(output.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl CompletionAudit {
    pub fn new(purpose: &str, resp: &LlmResponse, latency: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            purpose: purpose.to_string(),
            model: resp.model.clone(),
            prompt_tokens: resp.prompt_tokens,
            completion_tokens: resp.completion_tokens,
            output_hash: output_hash(&resp.content),
            latency_ms: latency.as_millis() as u64,
            called_at: Utc::now(),
        }
    }

    pub fn log(&self) {
        tracing::info!(
            audit_id = %self.id,
            purpose = %self.purpose,
            model = %self.model,
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            output_hash = %self.output_hash,
            latency_ms = self.latency_ms,
            "LLM completion"
        );
    }
}
