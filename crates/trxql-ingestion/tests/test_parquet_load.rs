//! Loads a small parquet file written to a temp dir into an in-memory sink.
//!
//! ```bash
//! cargo test --package trxql-ingestion --test test_parquet_load
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};

use arrow_array::{
    Float64Array, Int64Array, RecordBatch, StringArray, TimestampMicrosecondArray,
};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use async_trait::async_trait;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use pretty_assertions::assert_eq;
use tokio::sync::broadcast;

use trxql_db::{Transaction, TransactionSink};
use trxql_ingestion::{load_parquet, LoadOptions};

/// Mirrors `ON CONFLICT (transaction_id) DO NOTHING`.
#[derive(Default)]
struct MemorySink {
    rows: Mutex<Vec<Transaction>>,
    seen: Mutex<HashSet<String>>,
    calls: Mutex<usize>,
}

#[async_trait]
impl TransactionSink for MemorySink {
    async fn insert_batch(&self, rows: &[Transaction]) -> trxql_db::Result<u64> {
        *self.calls.lock().unwrap() += 1;
        let mut seen = self.seen.lock().unwrap();
        let mut stored = self.rows.lock().unwrap();
        let mut inserted = 0;
        for row in rows {
            if seen.insert(row.transaction_id.clone()) {
                stored.push(row.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

const BASE_MICROS: i64 = 1_704_067_200_000_000; // 2024-01-01T00:00:00Z

fn write_fixture(path: &Path, rows: usize, row_group_size: usize) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("transaction_id", DataType::Utf8, false),
        Field::new(
            "transaction_timestamp",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        ),
        Field::new("card_id", DataType::Int64, false),
        Field::new("merchant_city", DataType::Utf8, true),
        Field::new("transaction_amount_kzt", DataType::Float64, true),
        Field::new("__index_level_0__", DataType::Int64, true),
    ]));

    let ids: Vec<String> = (0..rows).map(|i| format!("trx-{i}")).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(TimestampMicrosecondArray::from(
                (0..rows as i64).map(|i| BASE_MICROS + i * 60_000_000).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from((0..rows as i64).map(|i| 100 + i).collect::<Vec<_>>())),
            Arc::new(StringArray::from(
                (0..rows).map(|i| (i % 2 == 0).then_some("Almaty")).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                (0..rows).map(|i| Some(i as f64 * 10.5)).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from((0..rows as i64).collect::<Vec<_>>())),
        ],
    )
    .unwrap();

    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_size)
        .build();
    let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn small_batches() -> LoadOptions {
    LoadOptions { read_batch_size: 2, insert_batch_size: 3, progress_every: 1 }
}

#[tokio::test]
async fn test_loads_every_row_group() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transactions.parquet");
    write_fixture(&path, 7, 4);

    let sink = MemorySink::default();
    let report = load_parquet(&path, &sink, &small_batches(), None).await.unwrap();

    assert_eq!(report.total_rows, 7);
    assert_eq!(report.submitted, 7);
    assert_eq!(report.inserted, 7);
    assert_eq!(report.skipped, 0);
    assert!(report.failed_row_groups.is_empty());
    // 7 rows in chunks of 3
    assert_eq!(*sink.calls.lock().unwrap(), 3);

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows[0].transaction_id, "trx-0");
    assert_eq!(rows[0].transaction_timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert_eq!(rows[6].card_id, 106);
    assert_eq!(rows[6].index_level_0, Some(6));
    assert_eq!(rows[1].merchant_city, None);
    assert_eq!(rows[2].transaction_amount_kzt, Some(21.0));
    assert_eq!(rows[0].wallet_type, None);
}

#[tokio::test]
async fn test_second_run_inserts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transactions.parquet");
    write_fixture(&path, 5, 2);

    let sink = MemorySink::default();
    let opts = LoadOptions::default();
    let first = load_parquet(&path, &sink, &opts, None).await.unwrap();
    let second = load_parquet(&path, &sink, &opts, None).await.unwrap();

    assert_eq!(first.inserted, 5);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 5);
    assert_eq!(sink.rows.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn test_progress_events_broadcast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transactions.parquet");
    write_fixture(&path, 6, 6);

    let (tx, mut rx) = broadcast::channel(16);
    let sink = MemorySink::default();
    load_parquet(&path, &sink, &small_batches(), Some(&tx)).await.unwrap();

    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    // 6 rows / 2 per batch
    assert_eq!(events.len(), 3);
    assert_eq!(events[2].batches, 3);
    assert_eq!(events[2].total_rows, 6);
    assert_eq!(events[2].row_groups, 1);
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let sink = MemorySink::default();
    let err = load_parquet(Path::new("/nonexistent/x.parquet"), &sink, &LoadOptions::default(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Could not open"));
}

/// Eight rows in row groups of four; row 3 has a null `card_id`.
fn write_fixture_with_bad_row(path: &Path) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("transaction_id", DataType::Utf8, false),
        Field::new(
            "transaction_timestamp",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        ),
        Field::new("card_id", DataType::Int64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from((0..8).map(|i| format!("trx-{i}")).collect::<Vec<_>>())),
            Arc::new(TimestampMicrosecondArray::from(vec![BASE_MICROS; 8])),
            Arc::new(Int64Array::from(
                (0..8_i64).map(|i| (i != 3).then_some(100 + i)).collect::<Vec<_>>(),
            )),
        ],
    )
    .unwrap();

    let props = WriterProperties::builder().set_max_row_group_size(4).build();
    let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn stored_ids(sink: &MemorySink) -> Vec<String> {
    sink.rows.lock().unwrap().iter().map(|r| r.transaction_id.clone()).collect()
}

#[tokio::test]
async fn test_failed_row_group_drops_its_buffered_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.parquet");
    write_fixture_with_bad_row(&path);

    let sink = MemorySink::default();
    let opts = LoadOptions { read_batch_size: 2, insert_batch_size: 100, progress_every: 0 };
    let report = load_parquet(&path, &sink, &opts, None).await.unwrap();

    assert_eq!(report.failed_row_groups, vec![0]);
    assert_eq!(report.submitted, 4);
    assert_eq!(stored_ids(&sink), vec!["trx-4", "trx-5", "trx-6", "trx-7"]);
}

#[tokio::test]
async fn test_retry_resumes_after_delivered_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.parquet");
    write_fixture_with_bad_row(&path);

    let sink = MemorySink::default();
    let opts = LoadOptions { read_batch_size: 2, insert_batch_size: 1, progress_every: 0 };
    let report = load_parquet(&path, &sink, &opts, None).await.unwrap();

    // trx-0 and trx-1 were inserted before the failure and are not sent again.
    assert_eq!(report.failed_row_groups, vec![0]);
    assert_eq!(report.submitted, 6);
    assert_eq!(report.inserted, 6);
    assert_eq!(report.skipped, 0);
    assert_eq!(
        stored_ids(&sink),
        vec!["trx-0", "trx-1", "trx-4", "trx-5", "trx-6", "trx-7"]
    );
}
