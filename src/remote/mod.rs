//! Remote document store contract
//!
//! The remote side is a hierarchical document store addressed as
//! `{tenants_collection}/{tenant_id}/{collection}`. Only the narrow set of
//! reads and writes the sync engine needs is exposed here.

mod memory;
mod sqlite;
mod value;

pub use memory::MemoryRemoteStore;
pub use sqlite::SqliteRemoteStore;
pub use value::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// A document fetched from a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub key: String,
    pub fields: FieldMap,
}

impl Document {
    pub fn new(key: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// The fixed tenant every collection path is rooted at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    pub tenants_collection: String,
    pub tenant_id: String,
}

impl TenantScope {
    pub fn new(tenants_collection: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            tenants_collection: tenants_collection.into(),
            tenant_id: tenant_id.into(),
        }
    }

    /// Full path of an entity collection under this tenant
    pub fn collection_path(&self, collection: &str) -> String {
        format!("{}/{}/{}", self.tenants_collection, self.tenant_id, collection)
    }
}

/// Collection-level reads and writes against the remote store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every document in a collection
    async fn fetch_all(&self, path: &str) -> Result<Vec<Document>, RemoteError>;

    /// Fetch the documents whose `field` equals `value`
    async fn fetch_filtered(
        &self,
        path: &str,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<Document>, RemoteError>;

    /// Fetch a single document by key
    async fn fetch(&self, path: &str, key: &str) -> Result<Option<Document>, RemoteError>;

    /// Create or replace a document. Server-timestamp sentinels in `fields`
    /// are resolved by the store at write time.
    async fn upsert(&self, path: &str, key: &str, fields: FieldMap) -> Result<(), RemoteError>;
}

/// Last path segment, i.e. the collection name
pub(crate) fn collection_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_path_is_tenant_rooted() {
        let scope = TenantScope::new("companies", "company_001");
        assert_eq!(scope.collection_path("routes"), "companies/company_001/routes");
        assert_eq!(collection_name("companies/company_001/routes"), "routes");
    }
}
