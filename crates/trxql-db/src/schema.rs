//! Row type and DDL for the `transaction` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One card transaction as stored in PostgreSQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_timestamp: DateTime<Utc>,
    pub card_id: i64,
    pub expiry_date: Option<String>,
    pub issuer_bank_name: Option<String>,
    pub merchant_id: Option<i64>,
    pub merchant_mcc: Option<i64>,
    pub mcc_category: Option<String>,
    pub merchant_city: Option<String>,
    pub transaction_type: Option<String>,
    pub transaction_amount_kzt: Option<f64>,
    pub original_amount: Option<f64>,
    pub transaction_currency: Option<String>,
    pub acquirer_country_iso: Option<String>,
    pub pos_entry_mode: Option<String>,
    pub wallet_type: Option<String>,
    pub index_level_0: Option<i64>,
}

pub const CREATE_TRANSACTION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS "transaction" (
    id                      BIGSERIAL PRIMARY KEY,
    transaction_id          VARCHAR(255) NOT NULL UNIQUE,
    transaction_timestamp   TIMESTAMPTZ NOT NULL,
    card_id                 BIGINT NOT NULL,
    expiry_date             VARCHAR(50),
    issuer_bank_name        VARCHAR(255),
    merchant_id             BIGINT,
    merchant_mcc            BIGINT,
    mcc_category            VARCHAR(255),
    merchant_city           VARCHAR(255),
    transaction_type        VARCHAR(100),
    transaction_amount_kzt  DOUBLE PRECISION,
    original_amount         DOUBLE PRECISION,
    transaction_currency    VARCHAR(10),
    acquirer_country_iso    VARCHAR(10),
    pos_entry_mode          VARCHAR(50),
    wallet_type             VARCHAR(100),
    index_level_0           BIGINT
)"#;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_TRANSACTION_TABLE,
    r#"CREATE INDEX IF NOT EXISTS idx_transaction_timestamp ON "transaction" (transaction_timestamp)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_transaction_merchant_id ON "transaction" (merchant_id)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_transaction_card_id ON "transaction" (card_id)"#,
];
