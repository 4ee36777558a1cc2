//! Document retrieval by ECLI identifier.
//!
//! Fetches a document with its metrics and flattens the PDF metadata blob
//! into the top level of the result. Used by both `ecli get` and
//! `GET /api/document/{ecli_id}`.

use serde_json::{Map, Value};
use sqlx::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::models::DocumentDetail;

const METADATA_FIELD: &str = "pdf_metadata";

/// Look up a document by its ECLI identifier.
///
/// Returns `Ok(None)` when no document has that identifier. Keys of a
/// metadata blob that decodes to a JSON object are merged into the
/// result and take precedence over column values; the raw blob is never
/// part of the result.
pub async fn get_document_by_ecli_id(
    config: &Config,
    ecli_id: &str,
) -> Result<Option<DocumentDetail>> {
    let mut conn = db::open(config).await?;
    let result = fetch_document(&mut conn, ecli_id).await;
    db::release(conn).await;
    result
}

async fn fetch_document(
    conn: &mut SqliteConnection,
    ecli_id: &str,
) -> Result<Option<DocumentDetail>> {
    let row = sqlx::query(
        r#"
        SELECT d.*, m.page_count, m.file_size, m.document_date, m.language, m.judge, m.pdf_metadata
        FROM documents d
        LEFT JOIN document_metrics m ON d.id = m.document_id
        WHERE d.ecli_id = ?
        "#,
    )
    .bind(ecli_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let fields = db::row_to_map(&row)?;
            Ok(Some(DocumentDetail(merge_metadata(fields))))
        }
        None => Ok(None),
    }
}

/// Remove the raw metadata column and fold its decoded keys into `fields`.
fn merge_metadata(mut fields: Map<String, Value>) -> Map<String, Value> {
    let Some(raw) = fields.remove(METADATA_FIELD) else {
        return fields;
    };

    let text = match raw {
        Value::String(text) => text,
        Value::Null => return fields,
        other => {
            tracing::warn!(value = %other, "pdf_metadata is not text, skipping merge");
            return fields;
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(metadata)) => {
            fields.extend(metadata);
            // A blob may carry its own nested `pdf_metadata` key.
            fields.remove(METADATA_FIELD);
        }
        Ok(_) => tracing::warn!("pdf_metadata is not a JSON object, skipping merge"),
        Err(e) => tracing::warn!(error = %e, "pdf_metadata is not valid JSON, skipping merge"),
    }

    fields
}

/// CLI entry point: print a document or exit non-zero when missing.
pub async fn run_get(config: &Config, ecli_id: &str) -> anyhow::Result<()> {
    let doc = match get_document_by_ecli_id(config, ecli_id).await? {
        Some(d) => d,
        None => {
            eprintln!("Error: document not found: {}", ecli_id);
            std::process::exit(1);
        }
    };

    println!("--- Document ---");
    for (key, value) in doc.fields() {
        let display = match value {
            Value::Null => "(none)".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("{:<20} {}", format!("{}:", key), display);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_merge_object_overrides_columns() {
        let merged = merge_metadata(fields(json!({
            "ecli_id": "ECLI:PT:STJ:2020:1",
            "judge": "column judge",
            "pdf_metadata": r#"{"judge": "X", "pdf_creator": "TCPDF"}"#,
        })));

        assert_eq!(merged["judge"], json!("X"));
        assert_eq!(merged["pdf_creator"], json!("TCPDF"));
        assert!(!merged.contains_key("pdf_metadata"));
    }

    #[test]
    fn test_merge_nested_metadata_key_is_dropped() {
        let merged = merge_metadata(fields(json!({
            "ecli_id": "ECLI:PT:STJ:2020:1",
            "pdf_metadata": r#"{"pdf_metadata": "raw", "pdf_title": "Acordao"}"#,
        })));

        assert!(!merged.contains_key("pdf_metadata"));
        assert_eq!(merged["pdf_title"], json!("Acordao"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_invalid_json_drops_blob() {
        let merged = merge_metadata(fields(json!({
            "ecli_id": "ECLI:PT:STJ:2020:1",
            "pdf_metadata": "{broken",
        })));

        assert_eq!(merged.len(), 1);
        assert!(!merged.contains_key("pdf_metadata"));
    }

    #[test]
    fn test_merge_non_object_drops_blob() {
        let merged = merge_metadata(fields(json!({
            "ecli_id": "ECLI:PT:STJ:2020:1",
            "pdf_metadata": "[1, 2, 3]",
        })));

        assert!(!merged.contains_key("pdf_metadata"));
        assert_eq!(merged["ecli_id"], json!("ECLI:PT:STJ:2020:1"));
    }

    #[test]
    fn test_merge_null_blob() {
        let merged = merge_metadata(fields(json!({
            "ecli_id": "ECLI:PT:STJ:2020:1",
            "pdf_metadata": null,
        })));

        assert!(!merged.contains_key("pdf_metadata"));
    }
}
