//! trxql-security: input gates in front of the query pipeline.
//!
//! Two checks run on every request:
//!   relevance: rejects free text that is not a question about the
//!               `transaction` table, before any model call is made
//!   safety   : rejects generated SQL containing a mutating, DDL or
//!               transaction-control verb, before it reaches the database

pub mod relevance;
pub mod safety;

pub use relevance::{check_relevance, is_relevant, Relevance};
pub use safety::{check_sql_safety, SafetyVerdict, DENYLIST};
