//! The `transaction` table schema.
//!
//! The column list is the single source for the system prompt, the relevance
//! filter, the DDL and the bulk loader.

/// Name of the only table the query pipeline targets.
pub const TRANSACTION_TABLE: &str = "transaction";

/// Column names in table order (surrogate `id` excluded).
pub const TRANSACTION_COLUMNS: [&str; 17] = [
    "transaction_id",
    "transaction_timestamp",
    "card_id",
    "expiry_date",
    "issuer_bank_name",
    "merchant_id",
    "merchant_mcc",
    "mcc_category",
    "merchant_city",
    "transaction_type",
    "transaction_amount_kzt",
    "original_amount",
    "transaction_currency",
    "acquirer_country_iso",
    "pos_entry_mode",
    "wallet_type",
    "index_level_0",
];

pub const COLUMN_COUNT: usize = TRANSACTION_COLUMNS.len();
