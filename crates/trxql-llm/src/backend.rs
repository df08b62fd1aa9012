//! LLM backend trait and the OpenAI chat-completions implementation.
//!
//! `OpenAiBackend` talks to `{base_url}/v1/chat/completions`, so any
//! OpenAI-compatible endpoint (Azure proxies, vLLM, LMStudio, …) works by
//! overriding the base URL.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Invalid API key: {0}")]
    Auth(String),
    #[error("Network connection failed: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("Malformed completion response: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::Protocol(err.to_string())
        } else {
            LlmError::Connection(err)
        }
    }
}

/// Coarse failure class reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationFailure {
    Auth,
    Connectivity,
    Protocol,
}

impl LlmError {
    pub fn kind(&self) -> GenerationFailure {
        match self {
            LlmError::Auth(_)        => GenerationFailure::Auth,
            LlmError::Connection(_)  => GenerationFailure::Connectivity,
            LlmError::RateLimited(_)
            | LlmError::Api { .. }
            | LlmError::Protocol(_)  => GenerationFailure::Protocol,
        }
    }
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
}

// ── Helpers: OpenAI wire format ──────────────────────────────────────────────

fn parse_openai_response(
    json: &serde_json::Value,
    fallback_model: &str,
) -> Result<LlmResponse, LlmError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| LlmError::Protocol(
            "response has no choices[0].message.content".to_string()
        ))?
        .to_string();

    Ok(LlmResponse {
        content,
        model: json["model"]
            .as_str()
            .unwrap_or(fallback_model)
            .to_string(),
        prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
        completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
    })
}

/// Map a non-2xx status and its raw body to an error.
fn api_error(status: u16, body_text: &str) -> LlmError {
    let body: serde_json::Value = serde_json::from_str(body_text).unwrap_or_default();
    let message = body["error"]["message"]
        .as_str()
        .or_else(|| body["message"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let raw = body_text.trim();
            if raw.is_empty() { "unknown API error".to_string() } else { raw.to_string() }
        });

    match status {
        401 | 403 => LlmError::Auth(message),
        429       => LlmError::RateLimited(message),
        _         => LlmError::Api { status, message },
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    if status >= 400 {
        return Err(api_error(status, &text));
    }
    serde_json::from_str(&text)
        .map_err(|e| LlmError::Protocol(format!("response body is not JSON: {e}")))
}

// ── OpenAI ────────────────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub model: String,
    pub base_url: String,
    max_tokens: Option<u32>,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            max_tokens: None,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Base URL without the `/v1` suffix.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut body = serde_json::json!({
            "model":       req.model.as_deref().unwrap_or(&self.model),
            "messages":    req.messages,
            "temperature": req.temperature.unwrap_or(0.3),
        });
        if let Some(max_tokens) = req.max_tokens.or(self.max_tokens) {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        let resp = self.client
            .post(self.completions_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        parse_openai_response(&json, &self.model)
    }

    fn model_id(&self) -> &str { &self.model }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
