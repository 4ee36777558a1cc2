//! User feedback submission.
//!
//! Feedback rows are append-only. The table is created on first write if
//! the database was bootstrapped without it.

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::error::{Error, Result};
use crate::models::{FeedbackAck, FeedbackRecord, StoredFeedback};

/// Persist a feedback record, stamping it with the server time.
///
/// The acknowledgment does not include the new row id.
pub async fn submit_feedback(config: &Config, record: &FeedbackRecord) -> Result<FeedbackAck> {
    if record.is_empty() {
        return Err(Error::EmptyFeedback);
    }

    let mut conn = db::open(config).await?;
    let result = insert_feedback(&mut conn, record).await;
    db::release(conn).await;
    result
}

/// All feedback rows, newest first.
pub async fn list_feedback(config: &Config) -> Result<Vec<StoredFeedback>> {
    let mut conn = db::open(config).await?;
    let result = fetch_feedback(&mut conn).await;
    db::release(conn).await;
    result
}

pub(crate) async fn ensure_feedback_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            feedback_type TEXT,
            rating INTEGER,
            comment TEXT,
            document_id TEXT,
            user_agent TEXT,
            timestamp TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_feedback(
    conn: &mut SqliteConnection,
    record: &FeedbackRecord,
) -> Result<FeedbackAck> {
    let timestamp = Utc::now().to_rfc3339();

    let mut tx = sqlx::Connection::begin(&mut *conn).await?;
    ensure_feedback_table(&mut *tx).await?;

    sqlx::query(
        r#"
        INSERT INTO user_feedback
            (feedback_type, rating, comment, document_id, user_agent, timestamp)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.feedback_type)
    .bind(record.rating)
    .bind(&record.comment)
    .bind(&record.document_id)
    .bind(&record.user_agent)
    .bind(&timestamp)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        feedback_type = record.feedback_type.as_deref().unwrap_or("-"),
        document_id = record.document_id.as_deref().unwrap_or("-"),
        "feedback stored"
    );

    Ok(FeedbackAck {
        success: true,
        message: "Feedback submitted successfully".to_string(),
    })
}

async fn fetch_feedback(conn: &mut SqliteConnection) -> Result<Vec<StoredFeedback>> {
    ensure_feedback_table(conn).await?;

    let rows = sqlx::query_as::<_, StoredFeedback>(
        r#"
        SELECT id, feedback_type, rating, comment, document_id, user_agent, timestamp
        FROM user_feedback
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// CLI entry point for `ecli feedback`.
pub async fn run_feedback(config: &Config, record: &FeedbackRecord) -> anyhow::Result<()> {
    let ack = submit_feedback(config, record).await?;
    println!("{}", ack.message);
    Ok(())
}
