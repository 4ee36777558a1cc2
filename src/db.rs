//! SQLite store adapter.
//!
//! Every public operation in this crate acquires its own connection with
//! [`open`], runs its queries through an inner function, and hands the
//! connection back to [`release`] whatever the inner result was. Nothing
//! sits between `open` and `release` that could return early, so a
//! connection never outlives the operation that opened it.
//!
//! Rows are addressed by column name (`Row::get("court")`). For lookups
//! that need the whole row as a mapping, [`row_to_map`] turns any
//! [`SqliteRow`] into a JSON object keyed by column name.

use base64::Engine;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};

use crate::config::Config;
use crate::error::{Error, Result};

/// Open a connection to an existing database.
///
/// Never creates the file: a missing or unreadable path is reported as
/// [`Error::StoreUnavailable`].
pub async fn open(config: &Config) -> Result<SqliteConnection> {
    let path = &config.db.path;

    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(false)
        .foreign_keys(true)
        .connect()
        .await
        .map_err(|source| Error::StoreUnavailable {
            path: path.clone(),
            source,
        })
}

/// Open a connection, creating the database file and its parent
/// directories if needed. Used by the bootstrap path only.
pub async fn create(config: &Config) -> Result<SqliteConnection> {
    let path = &config.db.path;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .connect()
        .await
        .map_err(|source| Error::StoreUnavailable {
            path: path.clone(),
            source,
        })
}

/// Close a connection obtained from [`open`] or [`create`].
pub async fn release(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "error while closing store connection");
    }
}

/// Convert a row into a JSON object keyed by column name.
///
/// Values are mapped by their storage class: INTEGER to a number, REAL to
/// a number, TEXT to a string, BLOB to a base64 string, NULL to null.
pub fn row_to_map(row: &SqliteRow) -> Result<Map<String, Value>> {
    let mut map = Map::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let raw = row.try_get_raw(idx)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" => Value::from(row.try_get::<i64, _>(idx)?),
                "REAL" => Value::from(row.try_get::<f64, _>(idx)?),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get(idx)?;
                    Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
                }
                _ => Value::String(row.try_get::<String, _>(idx)?),
            }
        };

        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}
