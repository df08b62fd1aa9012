//! Shared application state for the web server.

use minijinja::Environment;
use std::sync::Arc;
use std::time::Duration;

use trxql_config::Config;
use trxql_query::{QueryPipeline, SetupError};

pub const INDEX_TEMPLATE: &str = "index.html";

/// Shared state injected into every Axum handler.
pub struct AppState {
    /// `None` when no API key is configured; every submission then renders
    /// the missing-key error instead of running.
    pub pipeline: Option<Arc<QueryPipeline>>,
    pub templates: Environment<'static>,
    /// Request an analysis after every successful form query.
    pub analyze: bool,
    pub request_timeout: Duration,
}

pub fn templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))?;
    Ok(env)
}

impl AppState {
    pub fn new(pipeline: Option<Arc<QueryPipeline>>) -> Result<Self, minijinja::Error> {
        Ok(Self {
            pipeline,
            templates: templates()?,
            analyze: true,
            request_timeout: Duration::from_secs(30),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pipeline = match QueryPipeline::from_config(config) {
            Ok(p) => Some(Arc::new(p)),
            Err(SetupError::MissingApiKey) => {
                tracing::warn!("OPENAI_API_KEY is not set; queries will be refused until it is");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let mut state = Self::new(pipeline)?;
        state.analyze = config.analysis.web_enabled;
        state.request_timeout = Duration::from_secs(config.web.request_timeout_secs);
        Ok(state)
    }
}

pub type SharedState = Arc<AppState>;
