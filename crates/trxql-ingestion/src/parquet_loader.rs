//! Parquet → PostgreSQL bulk loader.
//!
//! Reads one row group at a time in fixed-size record batches, converts each
//! batch to [`Transaction`] rows and hands them to a [`TransactionSink`] in
//! insert-sized chunks. Inserts ignore `transaction_id` conflicts, so running
//! the same file twice adds nothing the second time.
//!
//! A row group that cannot be read or converted is retried once with
//! [`RETRY_READ_BATCH_SIZE`]-row batches, resuming after the rows that already
//! reached the sink. If the retry fails too, the group's rows that were still
//! buffered are dropped and the group is reported as failed; rows inserted
//! before the failure stay inserted. Sink errors abort the load.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int64Type, TimestampMicrosecondType};
use arrow_array::{Array, ArrayRef, RecordBatch};
use arrow_schema::{ArrowError, DataType, TimeUnit};
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use trxql_config::LoaderConfig;
use trxql_db::{DbError, Transaction, TransactionSink};

/// Column name pandas gives a serialized index.
pub const PARQUET_INDEX_COLUMN: &str = "__index_level_0__";

/// Record batch size used when retrying a failed row group.
pub const RETRY_READ_BATCH_SIZE: usize = 500;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Missing required column {0}")]
    MissingColumn(&'static str),

    #[error("Row {row}: {column} is null")]
    NullRequired { column: &'static str, row: usize },

    #[error("Row {row}: timestamp {micros}µs is out of range")]
    TimestampOutOfRange { row: usize, micros: i64 },

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

// ── Options / report ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Rows per record batch read from parquet.
    pub read_batch_size: usize,
    /// Rows buffered before one insert call.
    pub insert_batch_size: usize,
    /// Emit a progress event every N record batches.
    pub progress_every: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { read_batch_size: 1_000, insert_batch_size: 5_000, progress_every: 5 }
    }
}

impl From<&LoaderConfig> for LoadOptions {
    fn from(cfg: &LoaderConfig) -> Self {
        Self {
            read_batch_size: cfg.read_batch_size.max(1),
            insert_batch_size: cfg.insert_batch_size.max(1),
            ..Self::default()
        }
    }
}

/// Progress event (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct LoadProgress {
    pub row_group: usize,
    pub row_groups: usize,
    pub batches: usize,
    pub loaded: u64,
    pub total_rows: u64,
    pub percent: f64,
    pub rows_per_sec: f64,
    pub eta_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Row count from the file footer.
    pub total_rows: u64,
    /// Rows handed to the sink.
    pub submitted: u64,
    pub inserted: u64,
    /// Rows the sink skipped as duplicates.
    pub skipped: u64,
    /// Row groups that failed on retry as well. They may be partly loaded.
    pub failed_row_groups: Vec<usize>,
    pub elapsed: Duration,
}

// ── Batch conversion ─────────────────────────────────────────────────────────

fn cast_column(
    batch: &RecordBatch,
    name: &'static str,
    to: &DataType,
) -> Result<Option<ArrayRef>, LoadError> {
    match batch.schema().index_of(name) {
        Ok(idx) => Ok(Some(arrow_cast::cast(batch.column(idx), to)?)),
        Err(_) => Ok(None),
    }
}

fn required(
    batch: &RecordBatch,
    name: &'static str,
    to: &DataType,
) -> Result<ArrayRef, LoadError> {
    cast_column(batch, name, to)?.ok_or(LoadError::MissingColumn(name))
}

fn opt_string(col: &Option<ArrayRef>, row: usize) -> Option<String> {
    let arr = col.as_ref()?.as_string::<i32>();
    (!arr.is_null(row)).then(|| arr.value(row).to_string())
}

fn opt_i64(col: &Option<ArrayRef>, row: usize) -> Option<i64> {
    let arr = col.as_ref()?.as_primitive::<Int64Type>();
    (!arr.is_null(row)).then(|| arr.value(row))
}

fn opt_f64(col: &Option<ArrayRef>, row: usize) -> Option<f64> {
    let arr = col.as_ref()?.as_primitive::<Float64Type>();
    (!arr.is_null(row)).then(|| arr.value(row))
}

/// Convert one record batch. Naive timestamps are taken as UTC; tz-aware
/// ones are already stored as UTC instants.
pub fn batch_to_transactions(batch: &RecordBatch) -> Result<Vec<Transaction>, LoadError> {
    let utf8 = DataType::Utf8;
    let int64 = DataType::Int64;
    let float64 = DataType::Float64;
    let micros = DataType::Timestamp(TimeUnit::Microsecond, None);

    let ids = required(batch, "transaction_id", &utf8)?;
    let timestamps = required(batch, "transaction_timestamp", &micros)?;
    let cards = required(batch, "card_id", &int64)?;
    let ids = ids.as_string::<i32>();
    let timestamps = timestamps.as_primitive::<TimestampMicrosecondType>();
    let cards = cards.as_primitive::<Int64Type>();

    let expiry_date = cast_column(batch, "expiry_date", &utf8)?;
    let issuer_bank_name = cast_column(batch, "issuer_bank_name", &utf8)?;
    let merchant_id = cast_column(batch, "merchant_id", &int64)?;
    let merchant_mcc = cast_column(batch, "merchant_mcc", &int64)?;
    let mcc_category = cast_column(batch, "mcc_category", &utf8)?;
    let merchant_city = cast_column(batch, "merchant_city", &utf8)?;
    let transaction_type = cast_column(batch, "transaction_type", &utf8)?;
    let amount_kzt = cast_column(batch, "transaction_amount_kzt", &float64)?;
    let original_amount = cast_column(batch, "original_amount", &float64)?;
    let currency = cast_column(batch, "transaction_currency", &utf8)?;
    let acquirer_country = cast_column(batch, "acquirer_country_iso", &utf8)?;
    let pos_entry_mode = cast_column(batch, "pos_entry_mode", &utf8)?;
    let wallet_type = cast_column(batch, "wallet_type", &utf8)?;
    let index_level_0 = cast_column(batch, PARQUET_INDEX_COLUMN, &int64)?;

    (0..batch.num_rows())
        .map(|row| {
            if ids.is_null(row) {
                return Err(LoadError::NullRequired { column: "transaction_id", row });
            }
            if timestamps.is_null(row) {
                return Err(LoadError::NullRequired { column: "transaction_timestamp", row });
            }
            if cards.is_null(row) {
                return Err(LoadError::NullRequired { column: "card_id", row });
            }
            let micros = timestamps.value(row);
            let transaction_timestamp = DateTime::<Utc>::from_timestamp_micros(micros)
                .ok_or(LoadError::TimestampOutOfRange { row, micros })?;

            Ok(Transaction {
                transaction_id: ids.value(row).to_string(),
                transaction_timestamp,
                card_id: cards.value(row),
                expiry_date: opt_string(&expiry_date, row),
                issuer_bank_name: opt_string(&issuer_bank_name, row),
                merchant_id: opt_i64(&merchant_id, row),
                merchant_mcc: opt_i64(&merchant_mcc, row),
                mcc_category: opt_string(&mcc_category, row),
                merchant_city: opt_string(&merchant_city, row),
                transaction_type: opt_string(&transaction_type, row),
                transaction_amount_kzt: opt_f64(&amount_kzt, row),
                original_amount: opt_f64(&original_amount, row),
                transaction_currency: opt_string(&currency, row),
                acquirer_country_iso: opt_string(&acquirer_country, row),
                pos_entry_mode: opt_string(&pos_entry_mode, row),
                wallet_type: opt_string(&wallet_type, row),
                index_level_0: opt_i64(&index_level_0, row),
            })
        })
        .collect()
}

// ── Loader ────────────────────────────────────────────────────────────────────

struct Loader<'a> {
    path: &'a Path,
    sink: &'a dyn TransactionSink,
    opts: &'a LoadOptions,
    progress_tx: Option<&'a broadcast::Sender<LoadProgress>>,
    started: Instant,
    total_rows: u64,
    row_groups: usize,
    batches: usize,
    buffer: Vec<Transaction>,
    submitted: u64,
    inserted: u64,
    /// Rows of the current row group sitting in `buffer`.
    group_pending: usize,
    /// Rows of the current row group already handed to the sink.
    group_delivered: usize,
}

impl Loader<'_> {
    fn open(&self) -> Result<File, LoadError> {
        File::open(self.path).map_err(|source| LoadError::Io {
            path: self.path.to_path_buf(),
            source,
        })
    }

    async fn flush(&mut self) -> Result<(), LoadError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let inserted = self.sink.insert_batch(&self.buffer).await?;
        self.submitted += self.buffer.len() as u64;
        self.inserted += inserted;
        self.buffer.clear();
        self.group_delivered += self.group_pending;
        self.group_pending = 0;
        Ok(())
    }

    fn start_row_group(&mut self) {
        self.group_pending = 0;
        self.group_delivered = 0;
    }

    /// Drop the current row group's rows that never reached the sink.
    fn discard_pending(&mut self) {
        let keep = self.buffer.len() - self.group_pending;
        self.buffer.truncate(keep);
        self.group_pending = 0;
    }

    /// Read row group `rg`, skipping the rows an earlier attempt delivered.
    async fn load_row_group(&mut self, rg: usize, batch_size: usize) -> Result<(), LoadError> {
        let reader = ParquetRecordBatchReaderBuilder::try_new(self.open()?)?
            .with_batch_size(batch_size)
            .with_row_groups(vec![rg])
            .build()?;

        let mut to_skip = self.group_delivered;
        for batch in reader {
            let rows = batch_to_transactions(&batch?)?;
            let skip = to_skip.min(rows.len());
            to_skip -= skip;
            for row in rows.into_iter().skip(skip) {
                self.buffer.push(row);
                self.group_pending += 1;
                if self.buffer.len() >= self.opts.insert_batch_size {
                    self.flush().await?;
                }
            }

            self.batches += 1;
            if self.opts.progress_every > 0 && self.batches % self.opts.progress_every == 0 {
                self.report_progress(rg);
            }
        }
        Ok(())
    }

    fn report_progress(&self, rg: usize) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let percent = if self.total_rows > 0 {
            self.submitted as f64 / self.total_rows as f64 * 100.0
        } else {
            0.0
        };
        let rows_per_sec = if elapsed > 0.0 { self.submitted as f64 / elapsed } else { 0.0 };
        let eta_secs = (rows_per_sec > 0.0)
            .then(|| self.total_rows.saturating_sub(self.submitted) as f64 / rows_per_sec);

        info!(
            batch = self.batches,
            loaded = self.submitted,
            total = self.total_rows,
            percent = format_args!("{percent:.1}"),
            rows_per_sec = format_args!("{rows_per_sec:.0}"),
            eta_min = format_args!("{:.1}", eta_secs.unwrap_or(0.0) / 60.0),
            "load progress"
        );

        if let Some(tx) = self.progress_tx {
            let _ = tx.send(LoadProgress {
                row_group: rg,
                row_groups: self.row_groups,
                batches: self.batches,
                loaded: self.submitted,
                total_rows: self.total_rows,
                percent,
                rows_per_sec,
                eta_secs,
            });
        }
    }
}

/// Load every row group of `path` into `sink`.
pub async fn load_parquet(
    path: &Path,
    sink: &dyn TransactionSink,
    opts: &LoadOptions,
    progress_tx: Option<&broadcast::Sender<LoadProgress>>,
) -> Result<LoadReport, LoadError> {
    let mut loader = Loader {
        path,
        sink,
        opts,
        progress_tx,
        started: Instant::now(),
        total_rows: 0,
        row_groups: 0,
        batches: 0,
        buffer: Vec::with_capacity(opts.insert_batch_size),
        submitted: 0,
        inserted: 0,
        group_pending: 0,
        group_delivered: 0,
    };

    let metadata = ParquetRecordBatchReaderBuilder::try_new(loader.open()?)?
        .metadata()
        .clone();
    loader.total_rows = metadata.file_metadata().num_rows().max(0) as u64;
    loader.row_groups = metadata.num_row_groups();
    info!(
        path = %path.display(),
        total_rows = loader.total_rows,
        row_groups = loader.row_groups,
        "starting parquet load"
    );

    let mut failed_row_groups = Vec::new();
    for rg in 0..loader.row_groups {
        info!("Processing row group {} / {}", rg + 1, loader.row_groups);
        loader.start_row_group();
        let err = match loader.load_row_group(rg, opts.read_batch_size).await {
            Ok(()) => continue,
            Err(LoadError::Db(e)) => return Err(LoadError::Db(e)),
            Err(e) => e,
        };

        loader.discard_pending();
        let retry_batch_size = RETRY_READ_BATCH_SIZE.min(opts.read_batch_size);
        warn!(
            row_group = rg,
            error = %err,
            delivered = loader.group_delivered,
            retry_batch_size,
            "row group failed, retrying in smaller batches"
        );
        match loader.load_row_group(rg, retry_batch_size).await {
            Ok(()) => {}
            Err(LoadError::Db(e)) => return Err(LoadError::Db(e)),
            Err(e) => {
                loader.discard_pending();
                warn!(
                    row_group = rg,
                    error = %e,
                    delivered = loader.group_delivered,
                    "skipping row group"
                );
                failed_row_groups.push(rg);
            }
        }
    }
    loader.flush().await?;

    let report = LoadReport {
        total_rows: loader.total_rows,
        submitted: loader.submitted,
        inserted: loader.inserted,
        skipped: loader.submitted - loader.inserted,
        failed_row_groups,
        elapsed: loader.started.elapsed(),
    };
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        failed_row_groups = report.failed_row_groups.len(),
        elapsed_secs = report.elapsed.as_secs_f64(),
        "parquet load finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Int32Array, LargeStringArray, StringArray, TimestampMicrosecondArray};
    use arrow_schema::{Field, Schema};
    use std::sync::Arc;

    fn minimal_batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("transaction_id", DataType::LargeUtf8, true),
            Field::new(
                "transaction_timestamp",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new("card_id", DataType::Int32, true),
            Field::new("merchant_city", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(LargeStringArray::from(vec!["t1", "t2"])),
                Arc::new(TimestampMicrosecondArray::from(vec![0, 1_700_000_000_000_000])),
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("Almaty"), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_converts_with_casts_and_missing_optional_columns() {
        let rows = batch_to_transactions(&minimal_batch()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].transaction_id, "t1");
        assert_eq!(rows[0].transaction_timestamp.timestamp(), 0);
        assert_eq!(rows[1].transaction_timestamp.timestamp(), 1_700_000_000);
        assert_eq!(rows[1].card_id, 2);
        assert_eq!(rows[0].merchant_city.as_deref(), Some("Almaty"));
        assert_eq!(rows[1].merchant_city, None);
        assert_eq!(rows[0].wallet_type, None);
        assert_eq!(rows[0].index_level_0, None);
    }

    #[test]
    fn test_missing_required_column() {
        let schema = Schema::new(vec![Field::new("transaction_id", DataType::Utf8, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["t1"]))],
        )
        .unwrap();
        assert!(matches!(
            batch_to_transactions(&batch),
            Err(LoadError::MissingColumn("transaction_timestamp"))
        ));
    }

    #[test]
    fn test_null_required_value() {
        let schema = Schema::new(vec![
            Field::new("transaction_id", DataType::Utf8, true),
            Field::new(
                "transaction_timestamp",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new("card_id", DataType::Int32, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec![Some("t1")])),
                Arc::new(TimestampMicrosecondArray::from(vec![0])),
                Arc::new(Int32Array::from(vec![None])),
            ],
        )
        .unwrap();
        assert!(matches!(
            batch_to_transactions(&batch),
            Err(LoadError::NullRequired { column: "card_id", row: 0 })
        ));
    }

    #[test]
    fn test_options_from_config() {
        let opts = LoadOptions::from(&LoaderConfig { read_batch_size: 0, insert_batch_size: 10 });
        assert_eq!(opts.read_batch_size, 1);
        assert_eq!(opts.insert_batch_size, 10);
        assert_eq!(opts.progress_every, 5);
    }
}
