//! Sample corpus for demos and local development.
//!
//! Also exposes the low-level row writers used by ingestion-side tooling
//! and by the test suite.

use chrono::Local;
use serde_json::json;
use sqlx::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::models::{NewDocument, NewMetrics};
use crate::stats;

const SAMPLE_COURTS: [&str; 10] = [
    "STJ", "TRL", "TRP", "TRC", "TRE", "TRG", "STA", "TCA", "TCN", "TCS",
];

const SAMPLE_YEARS: [&str; 13] = [
    "1966", "1991", "1998", "2000", "2008", "2011", "2012", "2018", "2020", "2022", "2023",
    "2024", "2025",
];

const DOCS_PER_COURT: usize = 5;
const BYTES_PER_PAGE: i64 = 50 * 1024;

/// Insert a document row and return its id.
pub async fn insert_document(conn: &mut SqliteConnection, doc: &NewDocument) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO documents
            (ecli_id, court, year, case_number, file_path, added_date, last_updated)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&doc.ecli_id)
    .bind(&doc.court)
    .bind(&doc.year)
    .bind(&doc.case_number)
    .bind(&doc.file_path)
    .bind(&doc.added_date)
    .bind(&doc.last_updated)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Insert the metrics row for an existing document.
pub async fn insert_metrics(
    conn: &mut SqliteConnection,
    document_id: i64,
    metrics: &NewMetrics,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO document_metrics
            (document_id, page_count, file_size, document_date, language, judge, pdf_metadata)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(document_id)
    .bind(metrics.page_count)
    .bind(metrics.file_size)
    .bind(&metrics.document_date)
    .bind(&metrics.language)
    .bind(&metrics.judge)
    .bind(&metrics.pdf_metadata)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Populate an empty corpus with sample documents and generate a
/// snapshot. Returns the number of documents inserted (zero when the
/// corpus already had documents).
pub async fn seed_sample_data(config: &Config) -> Result<usize> {
    let mut conn = db::open(config).await?;
    let result = insert_sample_documents(&mut conn).await;
    db::release(conn).await;

    let inserted = result?;
    if inserted > 0 {
        stats::generate_snapshot(config).await?;
    }
    Ok(inserted)
}

async fn insert_sample_documents(conn: &mut SqliteConnection) -> Result<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&mut *conn)
        .await?;
    if existing > 0 {
        tracing::info!(existing, "corpus already populated, skipping sample data");
        return Ok(0);
    }

    let now = Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
    let mut tx = sqlx::Connection::begin(&mut *conn).await?;
    let mut inserted = 0;

    for court in SAMPLE_COURTS {
        for i in 1..=DOCS_PER_COURT {
            let (doc, metrics) = sample_document(court, i, &now);
            let id = insert_document(&mut *tx, &doc).await?;
            insert_metrics(&mut *tx, id, &metrics).await?;
            inserted += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(inserted, "added sample documents");
    Ok(inserted)
}

fn sample_document(court: &str, i: usize, now: &str) -> (NewDocument, NewMetrics) {
    let year = SAMPLE_YEARS[i % SAMPLE_YEARS.len()];
    let case_number = format!("{:06}", i);
    let ecli_id = format!("ECLI_PT_{}_{}_{}", court, year, case_number);
    let page_count = (i as i64 % 30) + 1;

    let metadata = json!({
        "pdf_creator": "TCPDF 6.4.2",
        "pdf_producer": "TCPDF 6.4.2 (http://www.tcpdf.org)",
        "pdf_title": ecli_id,
        "pdf_author": "Portuguese Judicial System",
        "pdf_creation_date": now,
        "pdf_mod_date": now,
    });

    let doc = NewDocument {
        file_path: Some(format!("sample_documents/{}.pdf", ecli_id)),
        ecli_id,
        court: Some(court.to_string()),
        year: Some(year.to_string()),
        case_number: Some(case_number),
        added_date: Some(now.to_string()),
        last_updated: Some(now.to_string()),
    };

    let metrics = NewMetrics {
        page_count: Some(page_count),
        file_size: Some(page_count * BYTES_PER_PAGE),
        document_date: Some(now.to_string()),
        language: Some("Portuguese".to_string()),
        judge: None,
        pdf_metadata: Some(metadata.to_string()),
    };

    (doc, metrics)
}

/// CLI entry point for `ecli seed`.
pub async fn run_seed(config: &Config) -> anyhow::Result<()> {
    let inserted = seed_sample_data(config).await?;
    if inserted == 0 {
        println!("Database already contains documents. Skipping sample data.");
    } else {
        println!("Added {} sample documents.", inserted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_document_shape() {
        let (doc, metrics) = sample_document("STJ", 2, "2024-05-01T10:00:00.000000");
        assert_eq!(doc.ecli_id, "ECLI_PT_STJ_1998_000002");
        assert_eq!(doc.year.as_deref(), Some("1998"));
        assert_eq!(metrics.page_count, Some(3));
        assert_eq!(metrics.file_size, Some(3 * 50 * 1024));

        let meta: serde_json::Value =
            serde_json::from_str(metrics.pdf_metadata.as_deref().unwrap()).unwrap();
        assert_eq!(meta["pdf_title"], "ECLI_PT_STJ_1998_000002");
    }
}
