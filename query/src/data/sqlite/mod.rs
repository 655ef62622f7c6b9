//! SQLite execution of compiled queries
//!
//! Thin adapter between [`CompiledQuery`](crate::data::filters::CompiledQuery)
//! and a `sqlx` SQLite pool: expands named parameters, applies pagination
//! defaults, binds JSON values.

mod bind;
mod select;

pub use bind::{PositionalQuery, expand_named};
pub use select::{Pagination, SelectPlan};

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use crate::core::constants::{SQLITE_BUSY_TIMEOUT_SECS, SQLITE_MAX_CONNECTIONS};
use crate::data::error::DataError;

/// Open an existing database file for reading
pub async fn open_read_only(path: &Path) -> Result<SqlitePool, DataError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS));

    let pool = SqlitePoolOptions::new()
        .max_connections(SQLITE_MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    tracing::debug!(path = %path.display(), "Opened SQLite database");
    Ok(pool)
}

/// Fetch one page of rows matching the plan
pub async fn fetch_all(
    pool: &SqlitePool,
    plan: &SelectPlan<'_>,
    pagination: &Pagination,
) -> Result<Vec<SqliteRow>, DataError> {
    let positional = plan.select(pagination)?;
    tracing::debug!(sql = %positional.sql, values = positional.values.len(), "Fetching rows");
    let rows = bind_all(&positional.sql, &positional.values)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Count all rows matching the plan, ignoring pagination
pub async fn count(pool: &SqlitePool, plan: &SelectPlan<'_>) -> Result<i64, DataError> {
    let positional = plan.count()?;
    tracing::debug!(sql = %positional.sql, "Counting rows");
    let row = bind_all(&positional.sql, &positional.values)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get::<i64, _>(0)?)
}

/// True when at least one row matches the plan
pub async fn exists(pool: &SqlitePool, plan: &SelectPlan<'_>) -> Result<bool, DataError> {
    let positional = plan.exists()?;
    let row = bind_all(&positional.sql, &positional.values)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get::<i64, _>(0)? != 0)
}

fn bind_all<'q>(sql: &'q str, values: &[Value]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    values.iter().fold(sqlx::query(sql), bind_value)
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if n.is_u64() {
                // beyond SQLite INTEGER range; keep the exact digits
                tracing::warn!(value = %n, "Integer exceeds i64 range, binding as text");
                query.bind(n.to_string())
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        // nested arrays and objects are stored as JSON text
        other => query.bind(other.to_string()),
    }
}
