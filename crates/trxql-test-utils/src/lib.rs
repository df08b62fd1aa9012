//! Test doubles for the query pipeline: a scripted LLM backend and an
//! in-memory query executor. Both count their calls so tests can assert
//! that a stage was never reached.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use trxql_common::{ResultSet, TRANSACTION_COLUMNS};
use trxql_db::{DbError, QueryExecutor};
use trxql_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse};

// ── LLM ──────────────────────────────────────────────────────────────────────

/// Replays queued completions in order.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_completion(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    pub fn with_error(self, err: LlmError) -> Self {
        self.push(Err(err));
        self
    }

    pub fn push(&self, entry: Result<String, LlmError>) {
        self.script.lock().unwrap().push_back(entry);
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(req);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Protocol("scripted backend exhausted".into())));
        next.map(|content| LlmResponse {
            content,
            model: "scripted".into(),
            prompt_tokens: 0,
            completion_tokens: 0,
        })
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

// ── Database ─────────────────────────────────────────────────────────────────

enum Fixture {
    Rows(ResultSet),
    Failure(String),
}

/// Returns the same fixture for every query and records what it was asked to run.
pub struct FixtureExecutor {
    fixture: Fixture,
    executed: Mutex<Vec<String>>,
}

impl FixtureExecutor {
    pub fn returning(result: ResultSet) -> Self {
        Self { fixture: Fixture::Rows(result), executed: Mutex::new(Vec::new()) }
    }

    /// Every call fails with a driver-level error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { fixture: Fixture::Failure(message.into()), executed: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for FixtureExecutor {
    async fn execute(&self, sql: &str) -> trxql_db::Result<ResultSet> {
        self.executed.lock().unwrap().push(sql.to_string());
        match &self.fixture {
            Fixture::Rows(rs) => Ok(rs.clone()),
            Fixture::Failure(msg) => Err(DbError::Sqlx(sqlx::Error::Protocol(msg.clone()))),
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// `n` synthetic rows over the full `transaction` column list, amounts descending.
pub fn transaction_rows(n: usize) -> ResultSet {
    let columns: Vec<String> = TRANSACTION_COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows = (0..n)
        .map(|i| {
            TRANSACTION_COLUMNS
                .iter()
                .map(|col| match *col {
                    "transaction_id" => Some(format!("trx-{i:04}")),
                    "transaction_amount_kzt" => Some(format!("{}.00", (n - i) * 1000)),
                    "merchant_city" => Some("Almaty".to_string()),
                    "wallet_type" => None,
                    _ => Some(i.to_string()),
                })
                .collect()
        })
        .collect();
    ResultSet::new(columns, rows)
}
