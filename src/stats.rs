//! Corpus statistics.
//!
//! [`get_corpus_stats`] serves the latest row of `corpus_stats` when one
//! exists, and otherwise recomputes the rollup from `documents` and
//! `document_metrics`. The recomputed value is returned as-is and not
//! written back; [`generate_snapshot`] is the explicit way to append a new
//! snapshot row. `ecli stats` prints the same data for the terminal.

use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::{Row, SqliteConnection};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::db;
use crate::error::{Error, Result};
use crate::models::CorpusStats;

/// Return the authoritative corpus statistics.
///
/// Reads the most recent snapshot; a corrupt `courts` or `years` column
/// degrades to an empty mapping for that column only. With no snapshot
/// row at all (or no readable `corpus_stats` table) the statistics are
/// recomputed from the raw tables and stamped with the current time.
pub async fn get_corpus_stats(config: &Config) -> Result<CorpusStats> {
    let mut conn = db::open(config).await?;
    let result = resolve_stats(&mut conn).await;
    db::release(conn).await;
    result
}

/// Recompute statistics from the raw tables and append them as a new
/// snapshot row. The returned value carries the new snapshot id.
pub async fn generate_snapshot(config: &Config) -> Result<CorpusStats> {
    let mut conn = db::open(config).await?;
    let result = write_snapshot(&mut conn).await;
    db::release(conn).await;
    result
}

async fn resolve_stats(conn: &mut SqliteConnection) -> Result<CorpusStats> {
    match latest_snapshot(conn).await {
        Ok(Some(stats)) => Ok(stats),
        Ok(None) => {
            tracing::debug!("no corpus snapshot found, recomputing from raw tables");
            compute_stats(conn).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "corpus snapshot unreadable, recomputing from raw tables");
            compute_stats(conn).await
        }
    }
}

async fn latest_snapshot(conn: &mut SqliteConnection) -> Result<Option<CorpusStats>> {
    let row = sqlx::query(
        r#"
        SELECT id, total_documents, total_pages, total_size_bytes, courts, years, generated_at
        FROM corpus_stats
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let courts_raw: Option<String> = row.try_get("courts")?;
    let years_raw: Option<String> = row.try_get("years")?;

    Ok(Some(CorpusStats {
        snapshot_id: Some(row.try_get("id")?),
        total_documents: row.try_get::<Option<i64>, _>("total_documents")?.unwrap_or(0),
        total_pages: row.try_get::<Option<i64>, _>("total_pages")?.unwrap_or(0),
        total_size_bytes: row
            .try_get::<Option<i64>, _>("total_size_bytes")?
            .unwrap_or(0),
        courts: decode_or_default("courts", courts_raw.as_deref()),
        years: decode_or_default("years", years_raw.as_deref()),
        generated_at: row
            .try_get::<Option<String>, _>("generated_at")?
            .unwrap_or_default(),
    }))
}

/// Decode one serialized column, falling back to `T::default()` when the
/// column is null, blank, or not valid for `T`. Each column is decoded on
/// its own so one corrupt field leaves its siblings intact.
pub(crate) fn decode_or_default<T>(field: &'static str, raw: Option<&str>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return T::default();
    };

    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(source) => {
            let err = Error::MalformedSnapshot { field, source };
            tracing::warn!(error = %err, "substituting empty mapping");
            T::default()
        }
    }
}

async fn compute_stats(conn: &mut SqliteConnection) -> Result<CorpusStats> {
    let total_documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&mut *conn)
        .await?;

    // SUM over zero rows is NULL; treat that as zero.
    let total_pages: Option<i64> =
        sqlx::query_scalar("SELECT SUM(page_count) FROM document_metrics")
            .fetch_one(&mut *conn)
            .await?;

    let total_size_bytes: Option<i64> =
        sqlx::query_scalar("SELECT SUM(file_size) FROM document_metrics")
            .fetch_one(&mut *conn)
            .await?;

    let courts = count_by(
        conn,
        r#"
        SELECT court AS key, COUNT(*) AS count
        FROM documents
        WHERE court IS NOT NULL AND court != ''
        GROUP BY court
        "#,
    )
    .await?;

    let years = count_by(
        conn,
        r#"
        SELECT CAST(year AS TEXT) AS key, COUNT(*) AS count
        FROM documents
        WHERE year IS NOT NULL AND CAST(year AS TEXT) != ''
        GROUP BY CAST(year AS TEXT)
        "#,
    )
    .await?;

    Ok(CorpusStats {
        snapshot_id: None,
        total_documents,
        total_pages: total_pages.unwrap_or(0),
        total_size_bytes: total_size_bytes.unwrap_or(0),
        courts,
        years,
        generated_at: Utc::now().to_rfc3339(),
    })
}

async fn count_by(conn: &mut SqliteConnection, sql: &str) -> Result<BTreeMap<String, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(sql).fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().collect())
}

async fn write_snapshot(conn: &mut SqliteConnection) -> Result<CorpusStats> {
    let mut stats = compute_stats(conn).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO corpus_stats
            (total_documents, total_pages, total_size_bytes, courts, years, generated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(stats.total_documents)
    .bind(stats.total_pages)
    .bind(stats.total_size_bytes)
    .bind(serde_json::to_string(&stats.courts)?)
    .bind(serde_json::to_string(&stats.years)?)
    .bind(&stats.generated_at)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    stats.snapshot_id = Some(id);

    tracing::info!(
        snapshot_id = id,
        documents = stats.total_documents,
        pages = stats.total_pages,
        "generated corpus snapshot"
    );

    Ok(stats)
}

/// CLI entry point: print corpus statistics, optionally regenerating the
/// snapshot first.
pub async fn run_stats(config: &Config, refresh: bool, json: bool) -> anyhow::Result<()> {
    let stats = if refresh {
        generate_snapshot(config).await?
    } else {
        get_corpus_stats(config).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("ECLI Corpus Stats");
    println!("=================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    match stats.snapshot_id {
        Some(id) => println!("  Snapshot:    #{} ({})", id, stats.generated_at),
        None => println!("  Snapshot:    none (computed {})", stats.generated_at),
    }
    println!();
    println!("  Documents:   {}", stats.total_documents);
    println!("  Pages:       {}", stats.total_pages);
    println!(
        "  Size:        {}",
        format_bytes(stats.total_size_bytes.max(0) as u64)
    );

    if !stats.courts.is_empty() {
        println!();
        println!("  By court:");
        for (court, count) in &stats.courts {
            println!("  {:<16} {:>8}", court, count);
        }
    }

    if !stats.years.is_empty() {
        println!();
        println!("  By year:");
        for (year, count) in &stats.years {
            println!("  {:<16} {:>8}", year, count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
