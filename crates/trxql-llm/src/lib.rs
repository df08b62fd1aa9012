//! trxql-llm: hosted language model access for SQL generation.
//!
//!   backend  : `LlmBackend` trait and the OpenAI chat-completions backend
//!   generator: system-prompted SQL generation and result analysis
//!   prompts  : prompt templates
//!   extract  : completion → bare SQL
//!   audit    : per-completion audit records

pub mod backend;
pub mod generator;
pub mod prompts;
pub mod extract;
pub mod audit;

pub use backend::{GenerationFailure, LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OpenAiBackend};
pub use extract::{extract_sql, is_refusal};
pub use generator::SqlGenerator;
