//! Natural-language query form and its JSON twin.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use trxql_common::Cell;
use trxql_query::{screen_prompt, QueryError, MISSING_API_KEY_MESSAGE};
use crate::state::{SharedState, INDEX_TEMPLATE};

#[derive(Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Deserialize)]
pub struct ApiQuery {
    pub prompt: String,
    pub analyze: Option<bool>,
}

#[derive(Serialize, Default)]
struct PageContext {
    prompt: Option<String>,
    error: Option<String>,
    sql_query: Option<String>,
    columns: Option<Vec<String>>,
    rows: Option<Vec<Vec<Cell>>>,
    analysis: Option<String>,
}

fn render(state: &SharedState, ctx: &PageContext) -> Response {
    let rendered = state
        .templates
        .get_template(INDEX_TEMPLATE)
        .and_then(|t| t.render(ctx));
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response()
        }
    }
}

pub async fn index_page(State(state): State<SharedState>) -> Response {
    render(&state, &PageContext::default())
}

pub async fn index_submit(
    State(state): State<SharedState>,
    Form(form): Form<PromptForm>,
) -> Response {
    let prompt = form.prompt.trim().to_string();
    let mut ctx = PageContext { prompt: Some(prompt.clone()), ..Default::default() };

    // Rejections that need no model call are reported even without a key.
    if let Err(e) = screen_prompt(&prompt) {
        ctx.error = Some(e.to_string());
        return render(&state, &ctx);
    }

    let Some(pipeline) = state.pipeline.as_ref() else {
        ctx.error = Some(MISSING_API_KEY_MESSAGE.to_string());
        return render(&state, &ctx);
    };

    match pipeline.run(&prompt, state.analyze).await {
        Ok(outcome) => {
            ctx.sql_query = Some(outcome.sql);
            ctx.columns = Some(outcome.result.columns);
            ctx.rows = Some(outcome.result.rows);
            ctx.analysis = outcome.analysis;
        }
        Err(e) => {
            ctx.sql_query = e.sql().map(str::to_string);
            ctx.error = Some(e.to_string());
        }
    }
    render(&state, &ctx)
}

fn error_status(err: &QueryError) -> StatusCode {
    match err {
        e if e.is_client_error()      => StatusCode::BAD_REQUEST,
        QueryError::Generation(_)     => StatusCode::BAD_GATEWAY,
        _                             => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn api_query(
    State(state): State<SharedState>,
    Json(req): Json<ApiQuery>,
) -> Response {
    if let Err(e) = screen_prompt(&req.prompt) {
        return (
            error_status(&e),
            Json(json!({ "error": e.to_string(), "sql": null })),
        )
            .into_response();
    }

    let Some(pipeline) = state.pipeline.as_ref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": MISSING_API_KEY_MESSAGE, "sql": null })),
        )
            .into_response();
    };

    let analyze = req.analyze.unwrap_or(false);
    match pipeline.run(&req.prompt, analyze).await {
        Ok(outcome) => Json(json!({
            "sql":      outcome.sql,
            "columns":  outcome.result.columns,
            "rows":     outcome.result.rows,
            "analysis": outcome.analysis,
        }))
        .into_response(),
        Err(e) => (
            error_status(&e),
            Json(json!({ "error": e.to_string(), "sql": e.sql() })),
        )
            .into_response(),
    }
}

pub async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "llm_configured": state.pipeline.is_some(),
    }))
}
