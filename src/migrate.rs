use sqlx::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::error::Result;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let mut conn = db::create(config).await?;
    let result = create_schema(&mut conn).await;
    db::release(conn).await;
    result
}

async fn create_schema(conn: &mut SqliteConnection) -> Result<()> {
    // Create documents table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ecli_id TEXT UNIQUE NOT NULL,
            court TEXT,
            year TEXT,
            case_number TEXT,
            file_path TEXT,
            added_date TEXT,
            last_updated TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    // Create document_metrics table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS document_metrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL,
            page_count INTEGER CHECK (page_count IS NULL OR page_count >= 0),
            file_size INTEGER CHECK (file_size IS NULL OR file_size >= 0),
            document_date TEXT,
            language TEXT,
            judge TEXT,
            pdf_metadata TEXT,
            UNIQUE(document_id),
            FOREIGN KEY (document_id) REFERENCES documents(id)
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    // Create corpus_stats table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS corpus_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            total_documents INTEGER,
            total_pages INTEGER,
            total_size_bytes INTEGER,
            courts TEXT,
            years TEXT,
            generated_at TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    crate::feedback::ensure_feedback_table(conn).await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_court ON documents(court)")
        .execute(&mut *conn)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_year ON documents(year)")
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_added_date ON documents(added_date DESC)",
    )
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_metrics_document_id ON document_metrics(document_id)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let tmp = TempDir::new().unwrap();
        let config = Config::for_db(tmp.path().join("index.db"));

        run_migrations(&config).await.unwrap();
        run_migrations(&config).await.unwrap();

        let mut conn = db::open(&config).await.unwrap();
        let tables: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&mut conn)
        .await
        .unwrap();
        db::release(conn).await;

        assert_eq!(
            tables,
            vec!["corpus_stats", "document_metrics", "documents", "user_feedback"]
        );
    }
}
