//! Local store contract
//!
//! The on-device relational store is reached only through this CRUD surface,
//! one entity kind at a time. `SqliteLocalStore` is the reference
//! implementation.

mod sqlite;

pub use sqlite::SqliteLocalStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::remote::{FieldMap, FieldValue};
use crate::sync::{EntityKind, SyncDirection, SyncMetadata};

/// A persisted entity: local id plus its domain fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRecord {
    pub id: i64,
    pub fields: FieldMap,
}

impl LocalRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: FieldMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// CRUD access to locally persisted entities
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get_all(&self, kind: EntityKind) -> Result<Vec<LocalRecord>>;

    async fn get_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<LocalRecord>>;

    /// Insert or replace by id. An id of 0 assigns a fresh one. Returns the
    /// id the record was stored under.
    async fn insert_or_replace(&self, kind: EntityKind, record: LocalRecord) -> Result<i64>;

    /// Replace an existing record; fails with `NotFound` when absent
    async fn update(&self, kind: EntityKind, record: LocalRecord) -> Result<()>;

    /// Queued operations still waiting to be sent
    async fn pending_operation_count(&self) -> Result<u32>;

    /// Queued operations that have failed
    async fn failed_operation_count(&self) -> Result<u32>;

    async fn save_sync_metadata(&self, metadata: &SyncMetadata) -> Result<()>;

    async fn sync_metadata(
        &self,
        kind: EntityKind,
        direction: SyncDirection,
    ) -> Result<Option<SyncMetadata>>;
}

