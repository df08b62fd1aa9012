//! Request orchestration.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use trxql_common::ResultSet;
use trxql_config::Config;
use trxql_db::{Database, PgExecutor, QueryExecutor};
use trxql_llm::{extract_sql, is_refusal, LlmBackend, OpenAiBackend, SqlGenerator};
use trxql_security::{check_relevance, check_sql_safety, SafetyVerdict};

use crate::analysis::{format_results_for_analysis, DEFAULT_ANALYSIS_ROWS};
use crate::error::{QueryError, SetupError};

/// Successful end of a request.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub sql: String,
    pub result: ResultSet,
    /// Present only when analysis was requested and the result was non-empty.
    pub analysis: Option<String>,
}

pub struct QueryPipeline {
    generator: SqlGenerator,
    executor: Arc<dyn QueryExecutor>,
    analysis_rows: usize,
}

impl QueryPipeline {
    pub fn new(backend: Arc<dyn LlmBackend>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self::with_generator(SqlGenerator::new(backend), executor)
    }

    pub fn with_generator(generator: SqlGenerator, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { generator, executor, analysis_rows: DEFAULT_ANALYSIS_ROWS }
    }

    /// OpenAI backend plus a lazily connected PostgreSQL pool, both taken
    /// from `config`. Fails only when the API key is absent or a client
    /// cannot be built; no network I/O happens here.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let api_key = config.llm.api_key.clone().ok_or(SetupError::MissingApiKey)?;

        let mut backend = OpenAiBackend::new(api_key, config.llm.model.clone())
            .with_base_url(config.llm.base_url.clone())
            .with_max_tokens(config.llm.max_tokens);
        if let Some(secs) = config.llm.request_timeout_secs {
            backend = backend.with_timeout(Duration::from_secs(secs))?;
        }

        let db = Database::connect_lazy(&config.database)?;
        let executor = PgExecutor::new(db.pool().clone());

        let generator = SqlGenerator::new(Arc::new(backend))
            .with_temperatures(config.llm.temperature, config.llm.analysis_temperature);
        tracing::info!(model = generator.model_id(), "query pipeline configured");

        Ok(Self::with_generator(generator, Arc::new(executor))
            .with_analysis_rows(config.analysis.max_rows))
    }

    pub fn with_analysis_rows(mut self, rows: usize) -> Self {
        self.analysis_rows = rows;
        self
    }

    /// Turn a request into vetted SQL without touching the database.
    pub async fn generate_sql(&self, prompt: &str) -> Result<String, QueryError> {
        let prompt = screen_prompt(prompt)?;

        let completion = self
            .generator
            .generate(prompt)
            .await
            .map_err(QueryError::Generation)?;

        if is_refusal(&completion) {
            tracing::info!("model refused request");
            return Err(QueryError::Refused(completion.trim().to_string()));
        }

        let sql = extract_sql(&completion);
        if let SafetyVerdict::Rejected { keyword } = check_sql_safety(&sql) {
            return Err(QueryError::Unsafe { keyword, query: sql });
        }

        tracing::debug!(%sql, "generated SQL passed safety gate");
        Ok(sql)
    }

    pub async fn run(&self, prompt: &str, analyze: bool) -> Result<QueryOutcome, QueryError> {
        let started = Instant::now();
        let sql = self.generate_sql(prompt).await?;

        let result = match self.executor.execute(&sql).await {
            Ok(rs) => rs,
            Err(source) => {
                tracing::warn!(%sql, error = %source, "query execution failed");
                return Err(QueryError::Execution { query: sql, source });
            }
        };

        let analysis = if analyze && !result.is_empty() {
            Some(self.analyze(prompt.trim(), &sql, &result).await)
        } else {
            None
        };

        tracing::info!(
            rows = result.row_count(),
            analyzed = analysis.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
        Ok(QueryOutcome { sql, result, analysis })
    }

    /// Analysis never fails the request; errors become the analysis text.
    pub async fn analyze(&self, prompt: &str, sql: &str, result: &ResultSet) -> String {
        let results_text = format_results_for_analysis(result, self.analysis_rows);
        match self.generator.analyze(prompt, sql, &results_text).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "analysis failed");
                format!("Could not generate analysis: {e}")
            }
        }
    }
}

/// Empty and relevance checks, run before any external call. Returns the
/// trimmed prompt.
pub fn screen_prompt(prompt: &str) -> Result<&str, QueryError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(QueryError::EmptyPrompt);
    }

    let verdict = check_relevance(prompt);
    if !verdict.is_accepted() {
        tracing::info!(verdict = verdict.as_str(), "request rejected by relevance filter");
        return Err(QueryError::Irrelevant { verdict });
    }
    Ok(prompt)
}
