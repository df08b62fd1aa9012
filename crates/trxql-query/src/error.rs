use thiserror::Error;
use trxql_db::DbError;
use trxql_llm::{GenerationFailure, LlmError};
use trxql_security::Relevance;

pub const IRRELEVANT_MESSAGE: &str =
    "This service only accepts SQL query requests for the transaction table. \
     Please provide a SQL-related question.";

pub const MISSING_API_KEY_MESSAGE: &str = "OpenAI API key not found in environment.";

/// Failure to assemble a pipeline from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Every way a request can end without a result. All are terminal.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Please enter a prompt.")]
    EmptyPrompt,

    #[error("{}", IRRELEVANT_MESSAGE)]
    Irrelevant { verdict: Relevance },

    #[error("{}", generation_message(.0))]
    Generation(#[source] LlmError),

    /// The model's own refusal text, shown verbatim.
    #[error("{0}")]
    Refused(String),

    #[error("SQL Safety Error: Dangerous SQL operation detected: {keyword}")]
    Unsafe { keyword: &'static str, query: String },

    #[error("Database Error: {source}")]
    Execution {
        query: String,
        #[source]
        source: DbError,
    },
}

fn generation_message(err: &LlmError) -> String {
    match err.kind() {
        GenerationFailure::Auth => {
            "Invalid API key. Please check OPENAI_API_KEY in your environment or .env file.".to_string()
        }
        GenerationFailure::Connectivity => err.to_string(),
        GenerationFailure::Protocol => format!("OpenAI API error: {err}"),
    }
}

impl QueryError {
    /// The generated query, when the request got far enough to have one.
    pub fn sql(&self) -> Option<&str> {
        match self {
            QueryError::Unsafe { query, .. } | QueryError::Execution { query, .. } => Some(query),
            _ => None,
        }
    }

    /// True when the failure is attributable to the user's input rather
    /// than to the model or the database.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QueryError::EmptyPrompt
                | QueryError::Irrelevant { .. }
                | QueryError::Refused(_)
                | QueryError::Unsafe { .. }
        )
    }
}
