//! trxql-common: Shared schema constants and result types used across all trxql crates.

pub mod schema;
pub mod result_set;

pub use result_set::{Cell, ResultSet};
pub use schema::{COLUMN_COUNT, TRANSACTION_COLUMNS, TRANSACTION_TABLE};
