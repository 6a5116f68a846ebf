//! In-memory remote store
//!
//! Keeps documents in process and resolves server timestamps with a strictly
//! increasing millisecond clock. Failures can be injected per collection or
//! per document, and accepted writes are logged in order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{collection_name, resolve_server_timestamps, Document, FieldMap, FieldValue, RemoteStore};
use crate::error::RemoteError;

type Collection = BTreeMap<String, FieldMap>;

#[derive(Default)]
pub struct MemoryRemoteStore {
    collections: RwLock<HashMap<String, Collection>>,
    failing: RwLock<HashSet<String>>,
    rejected: RwLock<HashSet<(String, String)>>,
    write_log: RwLock<Vec<String>>,
    writes: AtomicUsize,
    last_stamp: AtomicI64,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read and write against `collection` fail
    pub async fn fail_collection(&self, collection: &str) {
        self.failing.write().await.insert(collection.to_string());
    }

    /// Make upserts of one document fail; reads still succeed
    pub async fn reject_writes(&self, path: &str, key: &str) {
        self.rejected
            .write()
            .await
            .insert((path.to_string(), key.to_string()));
    }

    /// Accepted upserts as `"{path}/{key}"`, oldest first
    pub async fn write_log(&self) -> Vec<String> {
        self.write_log.read().await.clone()
    }

    /// Number of upserts accepted so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Place a document directly, bypassing write accounting
    pub async fn seed(&self, path: &str, key: &str, mut fields: FieldMap) {
        resolve_server_timestamps(&mut fields, self.next_stamp());
        self.collections
            .write()
            .await
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), fields);
    }

    pub async fn document(&self, path: &str, key: &str) -> Option<FieldMap> {
        self.collections
            .read()
            .await
            .get(path)
            .and_then(|c| c.get(key))
            .cloned()
    }

    pub async fn document_count(&self, path: &str) -> usize {
        self.collections.read().await.get(path).map_or(0, |c| c.len())
    }

    async fn check_available(&self, path: &str) -> Result<(), RemoteError> {
        if self.failing.read().await.contains(collection_name(path)) {
            return Err(RemoteError::CollectionUnavailable(path.to_string()));
        }
        Ok(())
    }

    fn next_stamp(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_millis();
        let mut previous = self.last_stamp.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(previous + 1);
            match self.last_stamp.compare_exchange(previous, candidate, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return DateTime::from_timestamp_millis(candidate).unwrap_or_else(Utc::now),
                Err(actual) => previous = actual,
            }
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn fetch_all(&self, path: &str) -> Result<Vec<Document>, RemoteError> {
        self.check_available(path).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(path)
            .map(|c| c.iter().map(|(k, f)| Document::new(k.clone(), f.clone())).collect())
            .unwrap_or_default())
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
        self.check_available(path).await?;
        Ok(self
            .document(path, key)
            .await
            .map(|fields| Document::new(key, fields)))
    }

    async fn upsert(&self, path: &str, key: &str, mut fields: FieldMap) -> Result<(), RemoteError> {
        self.check_available(path).await?;
        if self
            .rejected
            .read()
            .await
            .contains(&(path.to_string(), key.to_string()))
        {
            return Err(RemoteError::WriteRejected {
                path: path.to_string(),
                key: key.to_string(),
                reason: "rejected by store".to_string(),
            });
        }

        resolve_server_timestamps(&mut fields, self.next_stamp());
        self.collections
            .write()
            .await
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), fields);
        self.write_log.write().await.push(format!("{}/{}", path, key));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTES: &str = "companies/company_001/routes";

    fn route(name: &str, route_id: i64) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), FieldValue::from(name));
        fields.insert("routeId".to_string(), FieldValue::Integer(route_id));
        fields.insert("lastModified".to_string(), FieldValue::ServerTimestamp);
        fields
    }

    #[tokio::test]
    async fn test_upsert_resolves_sentinels_and_counts_writes() {
        let store = MemoryRemoteStore::new();
        store.upsert(ROUTES, "1", route("North", 1)).await.unwrap();
        store.upsert(ROUTES, "1", route("North 2", 1)).await.unwrap();

        assert_eq!(store.write_count(), 2);
        assert_eq!(store.document_count(ROUTES).await, 1);

        let doc = store.fetch(ROUTES, "1").await.unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&FieldValue::from("North 2")));
        assert!(matches!(doc.get("lastModified"), Some(FieldValue::Timestamp(_))));
    }

    #[tokio::test]
    async fn test_server_stamps_strictly_increase() {
        let store = MemoryRemoteStore::new();
        store.upsert(ROUTES, "1", route("a", 1)).await.unwrap();
        store.upsert(ROUTES, "2", route("b", 2)).await.unwrap();

        let first = store.fetch(ROUTES, "1").await.unwrap().unwrap();
        let second = store.fetch(ROUTES, "2").await.unwrap().unwrap();
        let a = first.get("lastModified").and_then(|v| v.timestamp_millis()).unwrap();
        let b = second.get("lastModified").and_then(|v| v.timestamp_millis()).unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_filtered_fetch() {
        let store = MemoryRemoteStore::new();
        store.seed(ROUTES, "1", route("a", 1)).await;
        store.seed(ROUTES, "2", route("b", 2)).await;

        let docs = store
            .fetch_filtered(ROUTES, "routeId", &FieldValue::Integer(2))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].key, "2");
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_collection() {
        let store = MemoryRemoteStore::new();
        store.fail_collection("routes").await;

        let err = store.fetch_all(ROUTES).await.unwrap_err();
        assert!(matches!(err, RemoteError::CollectionUnavailable(_)));
        assert!(store.upsert(ROUTES, "1", route("a", 1)).await.is_err());
        assert_eq!(store.write_count(), 0);
        assert!(store
            .fetch_all("companies/company_001/clients")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_rejected_document_leaves_others_writable() {
        let store = MemoryRemoteStore::new();
        store.reject_writes(ROUTES, "2").await;

        store.upsert(ROUTES, "1", route("a", 1)).await.unwrap();
        let err = store.upsert(ROUTES, "2", route("b", 2)).await.unwrap_err();
        assert!(matches!(err, RemoteError::WriteRejected { .. }));
        store.upsert(ROUTES, "3", route("c", 3)).await.unwrap();

        assert_eq!(
            store.write_log().await,
            vec![format!("{}/1", ROUTES), format!("{}/3", ROUTES)]
        );
        assert_eq!(store.write_count(), 2);
    }
}
