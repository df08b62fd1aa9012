//! Bulk insert path for the `transaction` table.

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use std::sync::Arc;
use trxql_common::{COLUMN_COUNT, TRANSACTION_COLUMNS};

use crate::database::Database;
use crate::error::Result;
use crate::schema::Transaction;

/// PostgreSQL accepts at most 65535 bind parameters per statement.
pub const ROWS_PER_STATEMENT: usize = 65_535 / COLUMN_COUNT;

/// Destination for loaded rows.
#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Insert `rows`, skipping any whose `transaction_id` already exists.
    /// Returns the number of rows actually inserted.
    async fn insert_batch(&self, rows: &[Transaction]) -> Result<u64>;
}

#[derive(Clone)]
pub struct TransactionRepository {
    db: Arc<Database>,
}

impl TransactionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "transaction""#)
            .fetch_one(self.db.pool())
            .await?;
        Ok(n)
    }

    pub async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        let sql = format!(
            r#"SELECT {} FROM "transaction" WHERE transaction_id = $1"#,
            TRANSACTION_COLUMNS.join(", ")
        );
        let row = sqlx::query_as::<_, Transaction>(&sql)
            .bind(transaction_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row)
    }
}

fn insert_builder(chunk: &[Transaction]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        r#"INSERT INTO "transaction" ({}) "#,
        TRANSACTION_COLUMNS.join(", ")
    ));
    qb.push_values(chunk, |mut b, t| {
        b.push_bind(t.transaction_id.clone())
            .push_bind(t.transaction_timestamp)
            .push_bind(t.card_id)
            .push_bind(t.expiry_date.clone())
            .push_bind(t.issuer_bank_name.clone())
            .push_bind(t.merchant_id)
            .push_bind(t.merchant_mcc)
            .push_bind(t.mcc_category.clone())
            .push_bind(t.merchant_city.clone())
            .push_bind(t.transaction_type.clone())
            .push_bind(t.transaction_amount_kzt)
            .push_bind(t.original_amount)
            .push_bind(t.transaction_currency.clone())
            .push_bind(t.acquirer_country_iso.clone())
            .push_bind(t.pos_entry_mode.clone())
            .push_bind(t.wallet_type.clone())
            .push_bind(t.index_level_0);
    });
    qb.push(" ON CONFLICT (transaction_id) DO NOTHING");
    qb
}

#[async_trait]
impl TransactionSink for TransactionRepository {
    async fn insert_batch(&self, rows: &[Transaction]) -> Result<u64> {
        let mut inserted = 0;
        for chunk in rows.chunks(ROWS_PER_STATEMENT) {
            let result = insert_builder(chunk).build().execute(self.db.pool()).await?;
            inserted += result.rows_affected();
        }
        tracing::debug!(rows = rows.len(), inserted, "batch inserted");
        Ok(inserted)
    }
}
