//! SQLite-backed document store
//!
//! Stores each document as a JSON field map keyed by
//! `(collection_path, doc_key)`. Used by the runner binary as a stand-in for
//! a hosted document database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{resolve_server_timestamps, Document, FieldMap, FieldValue, RemoteStore};
use crate::error::RemoteError;

pub struct SqliteRemoteStore {
    pool: SqlitePool,
}

impl SqliteRemoteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the document table
    pub async fn init(&self) -> Result<(), RemoteError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS remote_documents (
                collection_path TEXT NOT NULL,
                doc_key TEXT NOT NULL,
                fields TEXT NOT NULL,
                written_at TEXT NOT NULL,

                PRIMARY KEY (collection_path, doc_key)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn write_stamp() -> DateTime<Utc> {
        let now = Utc::now();
        DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }
}

#[async_trait]
impl RemoteStore for SqliteRemoteStore {
    async fn fetch_all(&self, path: &str) -> Result<Vec<Document>, RemoteError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT doc_key, fields
            FROM remote_documents
            WHERE collection_path = ?
            ORDER BY doc_key
            "#,
        )
        .bind(path)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_document()).collect()
    }

    async fn fetch_filtered(
        &self,
        path: &str,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<Document>, RemoteError> {
        let docs = self.fetch_all(path).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.get(field).is_some_and(|v| v.loosely_equals(value)))
            .collect())
    }

    async fn fetch(&self, path: &str, key: &str) -> Result<Option<Document>, RemoteError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT doc_key, fields FROM remote_documents WHERE collection_path = ? AND doc_key = ?",
        )
        .bind(path)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_document()).transpose()
    }

    async fn upsert(&self, path: &str, key: &str, mut fields: FieldMap) -> Result<(), RemoteError> {
        let stamp = Self::write_stamp();
        resolve_server_timestamps(&mut fields, stamp);
        let json = serde_json::to_string(&fields)?;

        sqlx::query(
            r#"
            INSERT INTO remote_documents (collection_path, doc_key, fields, written_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(collection_path, doc_key) DO UPDATE SET
                fields = excluded.fields,
                written_at = excluded.written_at
            "#,
        )
        .bind(path)
        .bind(key)
        .bind(&json)
        .bind(stamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    doc_key: String,
    fields: String,
}

impl DocumentRow {
    fn into_document(self) -> Result<Document, RemoteError> {
        let fields: FieldMap = serde_json::from_str(&self.fields)?;
        Ok(Document::new(self.doc_key, fields))
    }
}
