//! trxql: natural-language questions over the `transaction` table.
//! Entry point for the CLI binary.

mod cli;

use anyhow::Context;
use clap::Parser;
use dialoguer::Input;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use trxql_config::{Config, ENV_API_KEY};
use trxql_query::QueryPipeline;

use cli::{Args, Mode};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // stdout carries results only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref()).context("loading configuration")?;

    if !config.has_api_key() {
        eprintln!("Error: {ENV_API_KEY} not found in the environment or .env file.");
        eprintln!("Add it to .env:");
        eprintln!("{ENV_API_KEY}=your-api-key-here");
        return Ok(ExitCode::FAILURE);
    }
    let pipeline = QueryPipeline::from_config(&config)?;

    let prompt = match args.prompt_text() {
        Some(p) => p,
        None => Input::<String>::new()
            .with_prompt("Enter SQL query request")
            .interact_text()
            .context("reading request")?,
    };

    let code = cli::execute(
        &pipeline,
        &prompt,
        Mode::from(&args),
        &mut std::io::stdout(),
        &mut std::io::stderr(),
    )
    .await?;
    Ok(ExitCode::from(code as u8))
}
