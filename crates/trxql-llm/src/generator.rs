//! SQL generation and result analysis on top of an [`LlmBackend`].

use std::sync::Arc;
use std::time::Instant;

use crate::audit::CompletionAudit;
use crate::backend::{LlmBackend, LlmError, LlmRequest, Message};
use crate::prompts;

pub const GENERATION_TEMPERATURE: f32 = 0.3;
pub const ANALYSIS_TEMPERATURE: f32 = 0.7;

pub struct SqlGenerator {
    backend: Arc<dyn LlmBackend>,
    system_prompt: String,
    temperature: f32,
    analysis_temperature: f32,
}

impl SqlGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            system_prompt: prompts::system_prompt(),
            temperature: GENERATION_TEMPERATURE,
            analysis_temperature: ANALYSIS_TEMPERATURE,
        }
    }

    pub fn with_temperatures(mut self, generation: f32, analysis: f32) -> Self {
        self.temperature = generation;
        self.analysis_temperature = analysis;
        self
    }

    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Raw completion for a user request. Refusal and fence handling are
    /// left to the caller.
    pub async fn generate(&self, user_text: &str) -> Result<String, LlmError> {
        let req = LlmRequest {
            messages: vec![
                Message::system(self.system_prompt.as_str()),
                Message::user(user_text),
            ],
            model: None,
            max_tokens: None,
            temperature: Some(self.temperature),
        };
        self.complete("generate", req).await
    }

    pub async fn analyze(
        &self,
        original_request: &str,
        sql: &str,
        results_text: &str,
    ) -> Result<String, LlmError> {
        let req = LlmRequest {
            messages: vec![
                Message::system(prompts::ANALYSIS_SYSTEM_PROMPT),
                Message::user(prompts::analysis_prompt(original_request, sql, results_text)),
            ],
            model: None,
            max_tokens: None,
            temperature: Some(self.analysis_temperature),
        };
        self.complete("analyze", req).await
    }

    async fn complete(&self, purpose: &str, req: LlmRequest) -> Result<String, LlmError> {
        let started = Instant::now();
        let resp = self.backend.complete(req).await.map_err(|e| {
            tracing::warn!(purpose, model = self.backend.model_id(), error = %e, "LLM call failed");
            e
        })?;
        CompletionAudit::new(purpose, &resp, started.elapsed()).log();
        Ok(resp.content)
    }
}
