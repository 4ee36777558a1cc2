//! Recently added documents.
//!
//! `added_date` is filled in by the ingestion process and is missing on
//! legacy rows. The listing first orders by `added_date`; when none of the
//! returned rows carries a date, it queries again ordered by id instead.
//! This listing is best-effort: store errors are logged and produce an
//! empty list.

use sqlx::{Row, SqliteConnection};
use std::num::NonZeroU32;

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::models::DocumentSummary;

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecentOrder {
    AddedDate,
    Id,
}

impl RecentOrder {
    fn sql(self) -> &'static str {
        match self {
            RecentOrder::AddedDate => {
                r#"
                SELECT d.id, d.ecli_id, d.court, d.year, d.added_date, m.page_count, m.file_size
                FROM documents d
                LEFT JOIN document_metrics m ON d.id = m.document_id
                ORDER BY d.added_date DESC NULLS LAST, d.id DESC
                LIMIT ?
                "#
            }
            RecentOrder::Id => {
                r#"
                SELECT d.id, d.ecli_id, d.court, d.year, d.added_date, m.page_count, m.file_size
                FROM documents d
                LEFT JOIN document_metrics m ON d.id = m.document_id
                ORDER BY d.id DESC
                LIMIT ?
                "#
            }
        }
    }
}

/// Row as read from the store, before placeholder substitution.
#[derive(Debug, Clone)]
struct RawRecent {
    id: i64,
    ecli_id: Option<String>,
    court: Option<String>,
    year: Option<String>,
    added_date: Option<String>,
    page_count: Option<i64>,
    file_size: Option<i64>,
}

impl RawRecent {
    fn normalize(self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            ecli_id: self
                .ecli_id
                .unwrap_or_else(|| format!("ECLI_UNKNOWN_{}", self.id)),
            court: self.court.unwrap_or_else(|| UNKNOWN.to_string()),
            year: self.year.unwrap_or_else(|| UNKNOWN.to_string()),
            added_date: self.added_date.unwrap_or_else(|| UNKNOWN.to_string()),
            page_count: self.page_count,
            file_size: self.file_size,
        }
    }
}

/// Up to `limit` documents, newest first.
///
/// Never fails: any store error is logged and an empty list returned.
pub async fn get_recent_documents(config: &Config, limit: NonZeroU32) -> Vec<DocumentSummary> {
    match try_recent(config, limit).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::warn!(error = %e, "error getting recent documents");
            Vec::new()
        }
    }
}

async fn try_recent(config: &Config, limit: NonZeroU32) -> Result<Vec<DocumentSummary>> {
    let mut conn = db::open(config).await?;
    let result = fetch_recent(&mut conn, limit).await;
    db::release(conn).await;
    result
}

async fn fetch_recent(
    conn: &mut SqliteConnection,
    limit: NonZeroU32,
) -> Result<Vec<DocumentSummary>> {
    let mut rows = fetch_ordered(conn, RecentOrder::AddedDate, limit).await?;

    if !has_usable_dates(&rows) {
        tracing::debug!("no added_date on recent rows, falling back to id order");
        rows = fetch_ordered(conn, RecentOrder::Id, limit).await?;
    }

    Ok(rows.into_iter().map(RawRecent::normalize).collect())
}

fn has_usable_dates(rows: &[RawRecent]) -> bool {
    rows.iter().any(|r| {
        r.added_date
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    })
}

async fn fetch_ordered(
    conn: &mut SqliteConnection,
    order: RecentOrder,
    limit: NonZeroU32,
) -> Result<Vec<RawRecent>> {
    let rows = sqlx::query(order.sql())
        .bind(i64::from(limit.get()))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| -> Result<RawRecent> {
            Ok(RawRecent {
                id: row.try_get("id")?,
                ecli_id: row.try_get("ecli_id")?,
                court: row.try_get("court")?,
                year: row.try_get("year")?,
                added_date: row.try_get("added_date")?,
                page_count: row.try_get("page_count")?,
                file_size: row.try_get("file_size")?,
            })
        })
        .collect()
}

/// CLI entry point for `ecli recent`.
pub async fn run_recent(config: &Config, limit: NonZeroU32) -> anyhow::Result<()> {
    let docs = get_recent_documents(config, limit).await;

    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }

    println!(
        "{:<36} {:<8} {:<8} {:>6}   {}",
        "ECLI", "COURT", "YEAR", "PAGES", "ADDED"
    );
    for doc in &docs {
        println!(
            "{:<36} {:<8} {:<8} {:>6}   {}",
            doc.ecli_id,
            doc.court,
            doc.year,
            doc.page_count.map(|n| n.to_string()).unwrap_or_default(),
            doc.added_date
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, added: Option<&str>) -> RawRecent {
        RawRecent {
            id,
            ecli_id: Some(format!("ECLI:PT:STJ:2020:{}", id)),
            court: Some("STJ".to_string()),
            year: Some("2020".to_string()),
            added_date: added.map(str::to_string),
            page_count: Some(3),
            file_size: None,
        }
    }

    #[test]
    fn test_normalize_substitutes_placeholders() {
        let summary = RawRecent {
            id: 7,
            ecli_id: None,
            court: None,
            year: None,
            added_date: None,
            page_count: None,
            file_size: None,
        }
        .normalize();

        assert_eq!(summary.ecli_id, "ECLI_UNKNOWN_7");
        assert_eq!(summary.court, UNKNOWN);
        assert_eq!(summary.year, UNKNOWN);
        assert_eq!(summary.added_date, UNKNOWN);
        assert_eq!(summary.page_count, None);
    }

    #[test]
    fn test_normalize_keeps_present_values() {
        let summary = raw(3, Some("2024-01-02T03:04:05")).normalize();
        assert_eq!(summary.ecli_id, "ECLI:PT:STJ:2020:3");
        assert_eq!(summary.court, "STJ");
        assert_eq!(summary.added_date, "2024-01-02T03:04:05");
        assert_eq!(summary.page_count, Some(3));
    }

    #[test]
    fn test_usable_dates() {
        assert!(!has_usable_dates(&[]));
        assert!(!has_usable_dates(&[raw(1, None), raw(2, Some(""))]));
        assert!(has_usable_dates(&[raw(1, None), raw(2, Some("2024-01-01"))]));
    }
}
