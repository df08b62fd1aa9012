//! trxql-load: provision the `transaction` table from a parquet snapshot.
//!
//! Run with: cargo run -p trxql-ingestion --bin trxql-load -- example_dataset.parquet --init-schema

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trxql_config::Config;
use trxql_db::{Database, TransactionRepository};
use trxql_ingestion::{load_parquet, LoadOptions};

#[derive(Debug, Parser)]
#[command(name = "trxql-load", version, about = "Load transactions from parquet into PostgreSQL")]
struct Args {
    /// Parquet file to load.
    #[arg(default_value = "example_dataset.parquet")]
    path: PathBuf,

    /// Create the `transaction` table if it does not exist.
    #[arg(long)]
    init_schema: bool,

    /// Path to trxql.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows per parquet record batch.
    #[arg(long)]
    read_batch_size: Option<usize>,

    /// Rows per insert.
    #[arg(long)]
    insert_batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trxql=info,info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(n) = args.read_batch_size {
        config.loader.read_batch_size = n;
    }
    if let Some(n) = args.insert_batch_size {
        config.loader.insert_batch_size = n;
    }

    let db = Database::connect(&config.database)
        .await
        .context("connecting to PostgreSQL")?;
    if args.init_schema {
        db.initialize().await?;
    }
    let db = Arc::new(db);
    let repo = TransactionRepository::new(db.clone());

    let opts = LoadOptions::from(&config.loader);
    info!(
        path = %args.path.display(),
        read_batch_size = opts.read_batch_size,
        insert_batch_size = opts.insert_batch_size,
        "loading"
    );
    let report = load_parquet(&args.path, &repo, &opts, None)
        .await
        .with_context(|| format!("loading {}", args.path.display()))?;

    let secs = report.elapsed.as_secs_f64();
    println!(
        "Successfully loaded {} of {} rows ({} already present) in {:.1} minutes ({:.1} seconds)",
        report.inserted,
        report.total_rows,
        report.skipped,
        secs / 60.0,
        secs
    );
    if !report.failed_row_groups.is_empty() {
        println!("Skipped row groups: {:?}", report.failed_row_groups);
    }

    db.close().await;
    Ok(())
}
