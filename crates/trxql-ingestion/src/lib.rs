//! trxql-ingestion: one-off provisioning of the `transaction` table from a
//! parquet snapshot.

pub mod parquet_loader;

pub use parquet_loader::{load_parquet, LoadError, LoadOptions, LoadProgress, LoadReport};
