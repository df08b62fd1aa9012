//! trxql database layer
//!
//! PostgreSQL access through a shared `sqlx` pool: the `transaction` table
//! DDL, the generic query executor used by the pipeline, and the bulk
//! insert path used by the offline loader.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trxql_db::{Database, PgExecutor, QueryExecutor};
//!
//! # async fn run() -> trxql_db::Result<()> {
//! let db = Database::connect(&trxql_config::DatabaseConfig::default()).await?;
//! db.initialize().await?;
//!
//! let executor = PgExecutor::new(db.pool().clone());
//! let result = executor.execute("SELECT COUNT(*) FROM transaction").await?;
//! println!("{:?}", result.rows);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod error;
pub mod schema;
pub mod executor;
pub mod transactions;

pub use database::Database;
pub use error::{DbError, Result};
pub use executor::{PgExecutor, QueryExecutor};
pub use schema::Transaction;
pub use transactions::{TransactionRepository, TransactionSink, ROWS_PER_STATEMENT};
