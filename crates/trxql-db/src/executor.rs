//! Run vetted SQL text and render every cell as text.
//!
//! Column types with a native rendering below are decoded directly. When a
//! statement returns any other type (ranges, geometric types, records,
//! user enums, ...), the whole query is re-run wrapped in a projection that
//! casts every column to `text`, so PostgreSQL's own output function does
//! the rendering.

use async_trait::async_trait;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use std::time::Instant;
use trxql_common::{Cell, ResultSet};

use crate::error::{DbError, Result};

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute `sql` verbatim and collect the full result.
    async fn execute(&self, sql: &str) -> Result<ResultSet>;
}

#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn execute(&self, sql: &str) -> Result<ResultSet> {
        let started = Instant::now();
        let mut conn = self.pool.acquire().await?;

        // Preparing first gives column names even when no rows come back.
        let stmt = (&mut *conn).prepare(sql).await?;
        let columns: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let unsupported: Vec<&str> = stmt
            .columns()
            .iter()
            .map(|c| c.type_info().name())
            .filter(|name| !is_natively_rendered(name))
            .collect();

        let rows = if unsupported.is_empty() {
            let pg_rows = stmt.query().fetch_all(&mut *conn).await?;
            pg_rows
                .iter()
                .map(decode_row)
                .collect::<Result<Vec<_>>>()?
        } else {
            tracing::debug!(types = ?unsupported, "rendering result through text cast");
            let wrapped = text_cast_sql(sql, columns.len());
            let pg_rows = sqlx::query(&wrapped).fetch_all(&mut *conn).await?;
            pg_rows
                .iter()
                .map(|row| {
                    (0..row.len())
                        .map(|idx| row.try_get::<Option<String>, _>(idx).map_err(DbError::from))
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()?
        };

        tracing::info!(
            rows = rows.len(),
            columns = columns.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query executed"
        );
        Ok(ResultSet::new(columns, rows))
    }
}

const SCALAR_TYPES: &[&str] = &[
    "BOOL", "INT2", "INT4", "INT8", "FLOAT4", "FLOAT8", "NUMERIC",
    "TEXT", "VARCHAR", "BPCHAR", "NAME", "CHAR",
    "TIMESTAMPTZ", "TIMESTAMP", "DATE", "TIME", "INTERVAL",
    "UUID", "JSON", "JSONB",
];

const ARRAY_TYPES: &[&str] = &[
    "BOOL[]", "INT2[]", "INT4[]", "INT8[]", "FLOAT4[]", "FLOAT8[]", "NUMERIC[]",
    "TEXT[]", "VARCHAR[]", "BPCHAR[]", "NAME[]",
    "TIMESTAMPTZ[]", "TIMESTAMP[]", "DATE[]", "UUID[]",
];

fn is_natively_rendered(type_name: &str) -> bool {
    SCALAR_TYPES.contains(&type_name) || ARRAY_TYPES.contains(&type_name)
}

/// Wrap `sql` so that each of its `column_count` output columns comes back
/// as `text`. Positional aliases sidestep duplicate or anonymous names.
fn text_cast_sql(sql: &str, column_count: usize) -> String {
    let inner = sql.trim().trim_end_matches(';').trim_end();
    let aliases: Vec<String> = (1..=column_count).map(|i| format!("c{i}")).collect();
    let projection: Vec<String> = aliases.iter().map(|a| format!("{a}::text")).collect();
    format!(
        "SELECT {} FROM (\n{inner}\n) AS trxql_text({})",
        projection.join(", "),
        aliases.join(", ")
    )
}

fn decode_row(row: &PgRow) -> Result<Vec<Cell>> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &PgRow, idx: usize) -> Result<Cell> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(None);
    }
    let type_name = raw.type_info().name().to_string();

    let text = match type_name.as_str() {
        "BOOL"        => row.try_get::<bool, _>(idx)?.to_string(),
        "INT2"        => row.try_get::<i16, _>(idx)?.to_string(),
        "INT4"        => row.try_get::<i32, _>(idx)?.to_string(),
        "INT8"        => row.try_get::<i64, _>(idx)?.to_string(),
        "FLOAT4"      => float_text(row.try_get::<f32, _>(idx)?),
        "FLOAT8"      => float_text(row.try_get::<f64, _>(idx)?),
        "NUMERIC"     => row.try_get::<Decimal, _>(idx)?.to_string(),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => row.try_get::<String, _>(idx)?,
        "TIMESTAMPTZ" => timestamptz_text(row.try_get::<DateTime<Utc>, _>(idx)?),
        "TIMESTAMP"   => row.try_get::<NaiveDateTime, _>(idx)?.to_string(),
        "DATE"        => row.try_get::<NaiveDate, _>(idx)?.to_string(),
        "TIME"        => row.try_get::<NaiveTime, _>(idx)?.to_string(),
        "INTERVAL"    => interval_text(&row.try_get::<PgInterval, _>(idx)?),
        "UUID"        => row.try_get::<Uuid, _>(idx)?.to_string(),
        "JSON" | "JSONB" => row.try_get::<JsonValue, _>(idx)?.to_string(),

        "BOOL[]"      => array_cell::<bool>(row, idx, |v| v.to_string())?,
        "INT2[]"      => array_cell::<i16>(row, idx, |v| v.to_string())?,
        "INT4[]"      => array_cell::<i32>(row, idx, |v| v.to_string())?,
        "INT8[]"      => array_cell::<i64>(row, idx, |v| v.to_string())?,
        "FLOAT4[]"    => array_cell::<f32>(row, idx, float_text)?,
        "FLOAT8[]"    => array_cell::<f64>(row, idx, float_text)?,
        "NUMERIC[]"   => array_cell::<Decimal>(row, idx, |v| v.to_string())?,
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => array_cell::<String>(row, idx, |v| v)?,
        "TIMESTAMPTZ[]" => array_cell::<DateTime<Utc>>(row, idx, timestamptz_text)?,
        "TIMESTAMP[]" => array_cell::<NaiveDateTime>(row, idx, |v| v.to_string())?,
        "DATE[]"      => array_cell::<NaiveDate>(row, idx, |v| v.to_string())?,
        "UUID[]"      => array_cell::<Uuid>(row, idx, |v| v.to_string())?,

        // Statements with other types take the text-cast path before decoding.
        _ => {
            return Err(DbError::Decode {
                column: row.columns()[idx].name().to_string(),
                type_name,
            })
        }
    };
    Ok(Some(text))
}

fn array_cell<T>(row: &PgRow, idx: usize, render: impl Fn(T) -> String) -> Result<String>
where
    Vec<Option<T>>: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    let values = row.try_get::<Vec<Option<T>>, _>(idx)?;
    Ok(array_literal(values.into_iter().map(|v| v.map(&render))))
}

/// Whole floats keep their fractional part: `20.0`, not `20`.
fn float_text<F: std::fmt::Debug>(value: F) -> String {
    format!("{value:?}")
}

fn timestamptz_text(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string()
}

/// PostgreSQL array literal: `{a,"b c",NULL}`.
fn array_literal(items: impl Iterator<Item = Option<String>>) -> String {
    let parts: Vec<String> = items
        .map(|item| match item {
            None => "NULL".to_string(),
            Some(s) if needs_quoting(&s) => {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
            Some(s) => s,
        })
        .collect();
    format!("{{{}}}", parts.join(","))
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("NULL")
        || s.chars().any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_whitespace())
}

/// PostgreSQL's default interval style: `1 year 2 mons 3 days 04:05:06.5`.
fn interval_text(interval: &PgInterval) -> String {
    let mut parts = Vec::new();
    let years = interval.months / 12;
    let months = interval.months % 12;
    push_unit(&mut parts, years, "year", "years");
    push_unit(&mut parts, months, "mon", "mons");
    push_unit(&mut parts, interval.days, "day", "days");

    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let secs = micros / 1_000_000;
        let frac = micros % 1_000_000;
        let mut clock = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
        if frac != 0 {
            let digits = format!("{frac:06}");
            clock.push('.');
            clock.push_str(digits.trim_end_matches('0'));
        }
        parts.push(clock);
    }
    parts.join(" ")
}

fn push_unit(parts: &mut Vec<String>, n: i32, one: &str, many: &str) {
    if n == 0 {
        return;
    }
    let unit = if n == 1 { one } else { many };
    parts.push(format!("{n} {unit}"));
}
