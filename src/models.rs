//! Data types returned by the statistics and query engine.
//!
//! Every operation hands back one of these plain structures; no sqlx row
//! type crosses the crate boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A document row as written by ingestion.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub ecli_id: String,
    pub court: Option<String>,
    pub year: Option<String>,
    pub case_number: Option<String>,
    pub file_path: Option<String>,
    pub added_date: Option<String>,
    pub last_updated: Option<String>,
}

/// The metrics row attached one-to-one to a document.
#[derive(Debug, Clone, Default)]
pub struct NewMetrics {
    pub page_count: Option<i64>,
    pub file_size: Option<i64>,
    pub document_date: Option<String>,
    pub language: Option<String>,
    pub judge: Option<String>,
    /// Serialized JSON object with extracted PDF properties.
    pub pdf_metadata: Option<String>,
}

/// Corpus-wide rollup, either read from the latest snapshot row or
/// recomputed from the raw tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Id of the `corpus_stats` row this value came from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<i64>,
    pub total_documents: i64,
    pub total_pages: i64,
    pub total_size_bytes: i64,
    pub courts: BTreeMap<String, i64>,
    pub years: BTreeMap<String, i64>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CourtCount {
    pub court: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct YearCount {
    pub year: String,
    pub count: i64,
}

/// One document joined with its metrics row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, sqlx::FromRow)]
pub struct DocumentMetricRow {
    pub ecli_id: String,
    pub court: Option<String>,
    pub year: Option<String>,
    pub page_count: Option<i64>,
    pub file_size: Option<i64>,
}

/// Search hit. Metric fields are null for documents without metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DocumentView {
    pub ecli_id: String,
    pub court: Option<String>,
    pub year: Option<String>,
    pub added_date: Option<String>,
    pub page_count: Option<i64>,
    pub file_size: Option<i64>,
}

/// Entry in the recent-documents list, with nulls already replaced by
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: i64,
    pub ecli_id: String,
    pub court: String,
    pub year: String,
    pub added_date: String,
    pub page_count: Option<i64>,
    pub file_size: Option<i64>,
}

/// Full document record: document columns, metric columns and the keys of
/// the decoded metadata blob, flattened into one object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DocumentDetail(pub Map<String, Value>);

impl DocumentDetail {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// User feedback as posted by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(rename = "type", default)]
    pub feedback_type: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl FeedbackRecord {
    pub fn is_empty(&self) -> bool {
        self.feedback_type.is_none()
            && self.rating.is_none()
            && self.comment.is_none()
            && self.document_id.is_none()
            && self.user_agent.is_none()
    }
}

/// A persisted feedback row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StoredFeedback {
    pub id: i64,
    pub feedback_type: Option<String>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub document_id: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackAck {
    pub success: bool,
    pub message: String,
}
