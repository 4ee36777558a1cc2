//! Group-by queries behind the dashboard charts.

use sqlx::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::models::{CourtCount, DocumentMetricRow, YearCount};

/// Documents per court, most populous first. Null courts are skipped.
pub async fn get_documents_by_court(config: &Config) -> Result<Vec<CourtCount>> {
    let mut conn = db::open(config).await?;
    let result = fetch_by_court(&mut conn).await;
    db::release(conn).await;
    result
}

/// Documents per year, ascending by year. Null years are skipped.
pub async fn get_documents_by_year(config: &Config) -> Result<Vec<YearCount>> {
    let mut conn = db::open(config).await?;
    let result = fetch_by_year(&mut conn).await;
    db::release(conn).await;
    result
}

/// Page count and file size for every document that has a metrics row.
/// Documents without metrics are not returned.
pub async fn get_document_metrics(config: &Config) -> Result<Vec<DocumentMetricRow>> {
    let mut conn = db::open(config).await?;
    let result = fetch_metrics(&mut conn).await;
    db::release(conn).await;
    result
}

async fn fetch_by_court(conn: &mut SqliteConnection) -> Result<Vec<CourtCount>> {
    let rows = sqlx::query_as::<_, CourtCount>(
        r#"
        SELECT court, COUNT(*) AS count
        FROM documents
        WHERE court IS NOT NULL
        GROUP BY court
        ORDER BY count DESC, court ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

async fn fetch_by_year(conn: &mut SqliteConnection) -> Result<Vec<YearCount>> {
    let rows = sqlx::query_as::<_, YearCount>(
        r#"
        SELECT CAST(year AS TEXT) AS year, COUNT(*) AS count
        FROM documents
        WHERE year IS NOT NULL
        GROUP BY CAST(year AS TEXT)
        ORDER BY year ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

async fn fetch_metrics(conn: &mut SqliteConnection) -> Result<Vec<DocumentMetricRow>> {
    let rows = sqlx::query_as::<_, DocumentMetricRow>(
        r#"
        SELECT d.ecli_id, d.court, d.year, m.page_count, m.file_size
        FROM documents d
        JOIN document_metrics m ON d.id = m.document_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// CLI entry point for `ecli courts`.
pub async fn run_courts(config: &Config) -> anyhow::Result<()> {
    let rows = get_documents_by_court(config).await?;
    if rows.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!("{:<16} {:>8}", "COURT", "COUNT");
    for row in &rows {
        println!("{:<16} {:>8}", row.court, row.count);
    }
    Ok(())
}

/// CLI entry point for `ecli years`.
pub async fn run_years(config: &Config) -> anyhow::Result<()> {
    let rows = get_documents_by_year(config).await?;
    if rows.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!("{:<8} {:>8}", "YEAR", "COUNT");
    for row in &rows {
        println!("{:<8} {:>8}", row.year, row.count);
    }
    Ok(())
}

/// CLI entry point for `ecli metrics`.
pub async fn run_metrics(config: &Config) -> anyhow::Result<()> {
    let rows = get_document_metrics(config).await?;
    if rows.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!(
        "{:<36} {:<8} {:<6} {:>6} {:>12}",
        "ECLI", "COURT", "YEAR", "PAGES", "BYTES"
    );
    for row in &rows {
        println!(
            "{:<36} {:<8} {:<6} {:>6} {:>12}",
            row.ecli_id,
            row.court.as_deref().unwrap_or("-"),
            row.year.as_deref().unwrap_or("-"),
            row.page_count.map(|n| n.to_string()).unwrap_or_default(),
            row.file_size.map(|n| n.to_string()).unwrap_or_default(),
        );
    }
    Ok(())
}
