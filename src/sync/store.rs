//! Sync state persistence
//!
//! SQLite storage for the offline operation queue and per-domain sync
//! metadata.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::types::{EntityKind, SyncDirection, SyncMetadata, SyncOperation};
use crate::error::{Result, SyncError};

/// Queue row lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationStatus {
    Pending,
    Failed,
}

impl OperationStatus {
    fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Failed => "failed",
        }
    }
}

/// Repository for sync state persistence
pub struct SyncStateRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SyncStateRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a queued operation as pending
    pub async fn record_operation(&self, op: &SyncOperation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_operations (
                id, operation_type, entity_type, entity_id,
                payload, timestamp, retry_count, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(&op.id)
        .bind(op.op_type.as_str())
        .bind(&op.entity_type)
        .bind(&op.entity_id)
        .bind(&op.payload)
        .bind(op.timestamp.to_rfc3339())
        .bind(op.retry_count as i64)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Mark an operation as failed and bump its retry count
    pub async fn mark_failed(&self, id: &str, error: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sync_operations
            SET status = 'failed', retry_count = retry_count + 1, last_error = ?
            WHERE id = ?
            "#,
        )
        .bind(error)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SyncError::NotFound(format!("operation {}", id)));
        }
        Ok(())
    }

    pub async fn pending_count(&self) -> Result<u32> {
        self.count_by_status(OperationStatus::Pending).await
    }

    pub async fn failed_count(&self) -> Result<u32> {
        self.count_by_status(OperationStatus::Failed).await
    }

    async fn count_by_status(&self, status: OperationStatus) -> Result<u32> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_operations WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(self.pool)
            .await?;

        Ok(count.max(0) as u32)
    }

    /// Store the latest outcome for a domain and direction
    pub async fn save_metadata(&self, metadata: &SyncMetadata) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_metadata (
                entity, direction, synced, skipped, errors,
                duration_ms, completed_at, error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(entity, direction) DO UPDATE SET
                synced = excluded.synced,
                skipped = excluded.skipped,
                errors = excluded.errors,
                duration_ms = excluded.duration_ms,
                completed_at = excluded.completed_at,
                error = excluded.error
            "#,
        )
        .bind(metadata.entity.as_str())
        .bind(metadata.direction.as_str())
        .bind(metadata.synced as i64)
        .bind(metadata.skipped as i64)
        .bind(metadata.errors as i64)
        .bind(metadata.duration_ms as i64)
        .bind(metadata.completed_at.to_rfc3339())
        .bind(&metadata.error)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_metadata(
        &self,
        kind: EntityKind,
        direction: SyncDirection,
    ) -> Result<Option<SyncMetadata>> {
        let row = sqlx::query_as::<_, MetadataRow>(
            r#"
            SELECT entity, direction, synced, skipped, errors,
                   duration_ms, completed_at, error
            FROM sync_metadata
            WHERE entity = ? AND direction = ?
            "#,
        )
        .bind(kind.as_str())
        .bind(direction.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_metadata()).transpose()
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SyncError::InvalidRecord(format!("bad timestamp '{}': {}", value, e)))
}

#[derive(sqlx::FromRow)]
struct MetadataRow {
    entity: String,
    direction: String,
    synced: i64,
    skipped: i64,
    errors: i64,
    duration_ms: i64,
    completed_at: String,
    error: Option<String>,
}

impl MetadataRow {
    fn into_metadata(self) -> Result<SyncMetadata> {
        let direction = match self.direction.as_str() {
            "push" => SyncDirection::Push,
            _ => SyncDirection::Pull,
        };

        Ok(SyncMetadata {
            entity: self.entity.parse()?,
            direction,
            synced: self.synced.max(0) as u32,
            skipped: self.skipped.max(0) as u32,
            errors: self.errors.max(0) as u32,
            duration_ms: self.duration_ms.max(0) as u64,
            completed_at: parse_timestamp(&self.completed_at)?,
            error: self.error,
        })
    }
}
