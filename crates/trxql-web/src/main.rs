//! trxql web server
//!
//! Run with: cargo run -p trxql-web

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trxql_config::Config;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trxql=info,tower_http=info")),
        )
        .init();

    info!("Starting trxql web server, version {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(None).context("loading configuration")?;
    let state = trxql_web::state::AppState::from_config(&config)?;
    let app = trxql_web::router::build_router(state);

    let addr = config.web.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
