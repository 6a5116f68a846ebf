//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Entity records, one row per (kind, local id). Domain fields are kept as a
-- JSON field map so every entity kind shares one table.
CREATE TABLE IF NOT EXISTS entity_records (
    kind TEXT NOT NULL,
    id INTEGER NOT NULL,
    fields TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),

    PRIMARY KEY (kind, id)
);

CREATE INDEX IF NOT EXISTS idx_entity_records_kind ON entity_records(kind);

-- Offline operation queue
CREATE TABLE IF NOT EXISTS sync_operations (
    id TEXT PRIMARY KEY,
    operation_type TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    payload BLOB NOT NULL,
    timestamp TEXT NOT NULL,
    retry_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    last_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_sync_operations_status ON sync_operations(status);
CREATE INDEX IF NOT EXISTS idx_sync_operations_entity ON sync_operations(entity_type, entity_id);

-- Outcome of the last pull/push per entity kind
CREATE TABLE IF NOT EXISTS sync_metadata (
    entity TEXT NOT NULL,
    direction TEXT NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0,
    skipped INTEGER NOT NULL DEFAULT 0,
    errors INTEGER NOT NULL DEFAULT 0,
    duration_ms INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT NOT NULL,
    error TEXT,

    PRIMARY KEY (entity, direction)
);
"#;
