//! SQLite local store
//!
//! Every entity kind shares the `entity_records` table; the domain fields of
//! a record are stored as a JSON field map.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{LocalRecord, LocalStore};
use crate::error::{Result, SyncError};
use crate::remote::FieldMap;
use crate::sync::{EntityKind, SyncDirection, SyncMetadata, SyncOperation, SyncStateRepository};

#[derive(Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    /// Wrap a pool whose schema has already been initialized
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Persist an operation in the offline queue table
    pub async fn record_operation(&self, op: &SyncOperation) -> Result<()> {
        SyncStateRepository::new(&self.pool).record_operation(op).await
    }

    async fn next_id(&self, kind: EntityKind) -> Result<i64> {
        let (max,): (Option<i64>,) =
            sqlx::query_as("SELECT MAX(id) FROM entity_records WHERE kind = ?")
                .bind(kind.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(max.unwrap_or(0) + 1)
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn get_all(&self, kind: EntityKind) -> Result<Vec<LocalRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT id, fields
            FROM entity_records
            WHERE kind = ?
            ORDER BY id ASC
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_record()).collect()
    }

    async fn get_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<LocalRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT id, fields FROM entity_records WHERE kind = ? AND id = ?",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_record()).transpose()
    }

    async fn insert_or_replace(&self, kind: EntityKind, record: LocalRecord) -> Result<i64> {
        let id = if record.id == 0 {
            self.next_id(kind).await?
        } else {
            record.id
        };
        let fields = serde_json::to_string(&record.fields)?;

        sqlx::query(
            r#"
            INSERT INTO entity_records (kind, id, fields)
            VALUES (?, ?, ?)
            ON CONFLICT(kind, id) DO UPDATE SET
                fields = excluded.fields,
                updated_at = datetime('now')
            WHERE entity_records.fields <> excluded.fields
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(&fields)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update(&self, kind: EntityKind, record: LocalRecord) -> Result<()> {
        let fields = serde_json::to_string(&record.fields)?;

        let result = sqlx::query(
            r#"
            UPDATE entity_records
            SET fields = ?, updated_at = datetime('now')
            WHERE kind = ? AND id = ?
            "#,
        )
        .bind(&fields)
        .bind(kind.as_str())
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SyncError::NotFound(format!("{} {}", kind, record.id)));
        }

        Ok(())
    }

    async fn pending_operation_count(&self) -> Result<u32> {
        SyncStateRepository::new(&self.pool).pending_count().await
    }

    async fn failed_operation_count(&self) -> Result<u32> {
        SyncStateRepository::new(&self.pool).failed_count().await
    }

    async fn save_sync_metadata(&self, metadata: &SyncMetadata) -> Result<()> {
        SyncStateRepository::new(&self.pool).save_metadata(metadata).await
    }

    async fn sync_metadata(
        &self,
        kind: EntityKind,
        direction: SyncDirection,
    ) -> Result<Option<SyncMetadata>> {
        SyncStateRepository::new(&self.pool).get_metadata(kind, direction).await
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    fields: String,
}

impl RecordRow {
    fn into_record(self) -> Result<LocalRecord> {
        let fields: FieldMap = serde_json::from_str(&self.fields)?;
        Ok(LocalRecord { id: self.id, fields })
    }
}
