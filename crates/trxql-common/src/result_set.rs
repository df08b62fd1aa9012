//! Tabular query output shared by the executor and every renderer.

use serde::{Deserialize, Serialize};

/// One rendered cell. `None` is SQL NULL.
pub type Cell = Option<String>;

/// Column names plus rows, as returned by the query executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there is nothing worth rendering or analysing.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }
}
