//! Generic per-domain pull/push engine
//!
//! One handler is built per entity kind from its descriptor. Record failures
//! are counted and never abort the domain; only a failed whole-collection
//! fetch (or local listing) fails the domain.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;

use crate::error::{DecodeError, Result, SyncError};
use crate::local::{LocalRecord, LocalStore};
use crate::remote::{encode_for_remote, Document, FieldMap, FieldValue, RemoteStore, TenantScope};

use super::conflict::{ConflictResolver, Resolution};
use super::decode::{decode_fields, document_id, embedded_id, ID, LAST_MODIFIED, ROOM_ID, SYNC_TIMESTAMP};
use super::descriptor::{EntityDescriptor, IdentityStrategy};
use super::identity::IdentityMapper;
use super::types::{DomainOutcome, DomainReport, EntityKind, SyncDirection, SyncMetadata};

/// Per-run handler behaviour
#[derive(Debug, Clone, Copy)]
pub struct HandlerOptions {
    /// After each push, read the document back and store its server
    /// timestamp in the local business timestamp field
    pub read_back_timestamps: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            read_back_timestamps: true,
        }
    }
}

enum PullAction {
    Applied(i64),
    Unchanged(i64),
}

type ChildGroups = Vec<(EntityKind, HashMap<i64, Vec<LocalRecord>>)>;

pub struct EntitySyncHandler<'a> {
    descriptor: &'static EntityDescriptor,
    local: &'a dyn LocalStore,
    remote: &'a dyn RemoteStore,
    scope: &'a TenantScope,
    options: HandlerOptions,
}

impl<'a> EntitySyncHandler<'a> {
    pub fn new(
        kind: EntityKind,
        local: &'a dyn LocalStore,
        remote: &'a dyn RemoteStore,
        scope: &'a TenantScope,
        options: HandlerOptions,
    ) -> Self {
        Self {
            descriptor: kind.descriptor(),
            local,
            remote,
            scope,
            options,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.descriptor.kind
    }

    fn child(&self, kind: EntityKind) -> EntitySyncHandler<'a> {
        EntitySyncHandler::new(kind, self.local, self.remote, self.scope, self.options)
    }

    fn path(&self) -> String {
        self.scope.collection_path(self.descriptor.collection)
    }

    fn mapper(&self) -> IdentityMapper {
        IdentityMapper::new(self.descriptor)
    }

    fn resolver(&self) -> ConflictResolver {
        ConflictResolver::new(self.descriptor)
    }

    /// Run one direction and record its outcome as sync metadata
    pub async fn run(&self, direction: SyncDirection) -> DomainOutcome {
        let started = Instant::now();
        let result = match direction {
            SyncDirection::Pull => self.pull().await,
            SyncDirection::Push => self.push().await,
        };

        let outcome = match result {
            Ok(report) => {
                tracing::info!(
                    "{} {}: {} synced, {} skipped, {} errors",
                    direction.as_str(),
                    self.kind(),
                    report.synced,
                    report.skipped,
                    report.errors
                );
                DomainOutcome::Completed(report)
            }
            Err(e) => {
                tracing::error!("{} {} failed: {}", direction.as_str(), self.kind(), e);
                DomainOutcome::Failed(e.to_string())
            }
        };

        let elapsed = started.elapsed().as_millis() as u64;
        let metadata = SyncMetadata::from_outcome(self.kind(), direction, &outcome, elapsed);
        if let Err(e) = self.local.save_sync_metadata(&metadata).await {
            tracing::warn!("Failed to record sync metadata for {}: {}", self.kind(), e);
        }

        outcome
    }

    /// Pull every document of the domain into the local store
    pub async fn pull(&self) -> Result<DomainReport> {
        let path = self.path();
        let docs = self.remote.fetch_all(&path).await?;
        tracing::debug!("Pulling {} documents from {}", docs.len(), path);

        let mut composite_ids = if self.mapper().is_composite() {
            self.composite_index().await?
        } else {
            HashMap::new()
        };

        let now = Utc::now();
        let mut report = DomainReport::default();
        for doc in &docs {
            let parent_id = self.apply_document(doc, &mut composite_ids, now, &mut report).await;

            if let Some(id) = parent_id {
                for child in self.descriptor.children {
                    self.pull_children(*child, id, &mut report).await;
                }
            }
        }

        Ok(report)
    }

    /// Pull the child documents that reference `parent_id`
    pub async fn pull_scoped(&self, parent_id: i64) -> Result<DomainReport> {
        let foreign_key = match self.descriptor.identity {
            IdentityStrategy::ParentScoped { foreign_key, .. } => foreign_key,
            _ => return Ok(DomainReport::default()),
        };

        let path = self.path();
        let value = FieldValue::Integer(parent_id);
        let mut docs = Vec::new();
        for name in foreign_key {
            docs = self.remote.fetch_filtered(&path, name, &value).await?;
            if !docs.is_empty() {
                break;
            }
        }

        let now = Utc::now();
        let mut unused = HashMap::new();
        let mut report = DomainReport::default();
        for doc in &docs {
            self.apply_document(doc, &mut unused, now, &mut report).await;
        }

        Ok(report)
    }

    async fn pull_children(&self, kind: EntityKind, parent_id: i64, report: &mut DomainReport) {
        match self.child(kind).pull_scoped(parent_id).await {
            Ok(child_report) => report.merge(child_report),
            Err(e) => {
                tracing::warn!(
                    "Failed to pull {} for {} {}: {}",
                    kind,
                    self.kind(),
                    parent_id,
                    e
                );
                report.errors += 1;
            }
        }
    }

    /// Apply one document and tally it. Returns the local id when the record
    /// is present locally afterwards.
    async fn apply_document(
        &self,
        doc: &Document,
        composite_ids: &mut HashMap<String, i64>,
        now: DateTime<Utc>,
        report: &mut DomainReport,
    ) -> Option<i64> {
        match self.pull_document(doc, composite_ids, now).await {
            Ok(PullAction::Applied(id)) => {
                report.synced += 1;
                Some(id)
            }
            Ok(PullAction::Unchanged(id)) => {
                report.skipped += 1;
                Some(id)
            }
            Err(SyncError::Decode(e)) if e.is_skip() => {
                tracing::warn!("Skipping {} document {}: {}", self.kind(), doc.key, e);
                report.skipped += 1;
                None
            }
            Err(e) => {
                tracing::warn!("Failed to pull {} document {}: {}", self.kind(), doc.key, e);
                report.errors += 1;
                None
            }
        }
    }

    async fn pull_document(
        &self,
        doc: &Document,
        composite_ids: &mut HashMap<String, i64>,
        now: DateTime<Utc>,
    ) -> Result<PullAction> {
        let fields = decode_fields(self.descriptor, doc)?;
        let mapper = self.mapper();

        let composite_key = if mapper.is_composite() {
            let key = mapper
                .composite_key(&fields)
                .ok_or_else(|| DecodeError::MissingId(doc.key.clone()))?;
            Some(key)
        } else {
            None
        };

        let (id, existing) = match &composite_key {
            Some(key) => self.locate_composite(doc, key, composite_ids).await?,
            None => {
                let id = document_id(doc).ok_or_else(|| DecodeError::MissingId(doc.key.clone()))?;
                (id, self.local.get_by_id(self.kind(), id).await?)
            }
        };

        let resolver = self.resolver();
        let carried_ts = resolver.remote_timestamp(doc);
        let remote_ts = ConflictResolver::effective_timestamp(carried_ts, now);
        let local_ts = existing.as_ref().map_or(0, |r| resolver.local_timestamp(r));

        match ConflictResolver::resolve(remote_ts, existing.is_some(), local_ts) {
            Resolution::Skip => {
                tracing::debug!(
                    "{} {} is up to date (remote {} <= local {})",
                    self.kind(),
                    id,
                    remote_ts,
                    local_ts
                );
                Ok(PullAction::Unchanged(id))
            }
            resolution => {
                let mut record = LocalRecord { id, fields };
                if let (Some(ts_field), Some(ts)) = (self.descriptor.timestamp_field, carried_ts) {
                    record.set(ts_field, ts);
                }

                let stored = self.local.insert_or_replace(self.kind(), record).await?;
                if let Some(key) = composite_key {
                    composite_ids.insert(key, stored);
                }

                tracing::debug!("{:?} {} {}", resolution, self.kind(), stored);
                Ok(PullAction::Applied(stored))
            }
        }
    }

    /// Local id and record for a junction document. Existing rows with the
    /// same key pair win; otherwise the embedded id is reused when free.
    async fn locate_composite(
        &self,
        doc: &Document,
        key: &str,
        composite_ids: &HashMap<String, i64>,
    ) -> Result<(i64, Option<LocalRecord>)> {
        if let Some(id) = composite_ids.get(key).copied() {
            return Ok((id, self.local.get_by_id(self.kind(), id).await?));
        }

        if let Some(id) = embedded_id(doc) {
            if self.local.get_by_id(self.kind(), id).await?.is_none() {
                return Ok((id, None));
            }
        }

        Ok((0, None))
    }

    async fn composite_index(&self) -> Result<HashMap<String, i64>> {
        let mapper = self.mapper();
        let records = self.local.get_all(self.kind()).await?;

        Ok(records
            .iter()
            .filter_map(|r| mapper.composite_key(&r.fields).map(|key| (key, r.id)))
            .collect())
    }

    /// Push every local record of the domain, each parent followed by its
    /// children
    pub async fn push(&self) -> Result<DomainReport> {
        let records = self.local.get_all(self.kind()).await?;
        let children = self.child_groups().await?;
        tracing::debug!("Pushing {} {} records", records.len(), self.kind());

        let mut report = DomainReport::default();
        for record in records {
            let id = record.id;
            if !self.push_one(record, &mut report).await {
                continue;
            }

            for (kind, groups) in &children {
                if let Some(rows) = groups.get(&id) {
                    let child = self.child(*kind);
                    for row in rows {
                        child.push_one(row.clone(), &mut report).await;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn child_groups(&self) -> Result<ChildGroups> {
        let mut groups = Vec::new();
        for kind in self.descriptor.children {
            let mapper = IdentityMapper::new(kind.descriptor());
            let mut by_parent: HashMap<i64, Vec<LocalRecord>> = HashMap::new();

            for record in self.local.get_all(*kind).await? {
                match mapper.parent_id(&record.fields) {
                    Some(parent) => by_parent.entry(parent).or_default().push(record),
                    None => tracing::debug!("{} {} has no parent; not pushed", kind, record.id),
                }
            }
            groups.push((*kind, by_parent));
        }
        Ok(groups)
    }

    /// Push one record and tally it. Returns whether the write succeeded.
    async fn push_one(&self, record: LocalRecord, report: &mut DomainReport) -> bool {
        let id = record.id;
        match self.push_record(record).await {
            Ok(()) => {
                report.synced += 1;
                true
            }
            Err(SyncError::Decode(e)) if e.is_skip() => {
                tracing::warn!("Skipping push of {} {}: {}", self.kind(), id, e);
                report.skipped += 1;
                false
            }
            Err(e) => {
                tracing::warn!("Failed to push {} {}: {}", self.kind(), id, e);
                report.errors += 1;
                false
            }
        }
    }

    async fn push_record(&self, record: LocalRecord) -> Result<()> {
        let path = self.path();
        let key = self.mapper().remote_key(&record)?;
        let fields = self.to_document(&record);

        self.remote.upsert(&path, &key, fields).await?;

        if self.options.read_back_timestamps {
            if let Some(ts_field) = self.descriptor.timestamp_field {
                self.adopt_server_timestamp(&path, &key, record, ts_field).await;
            }
        }

        Ok(())
    }

    /// Remote field map for a record, bookkeeping fields included
    fn to_document(&self, record: &LocalRecord) -> FieldMap {
        let mut fields: FieldMap = record
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), encode_for_remote(name, value)))
            .collect();

        fields.insert(ROOM_ID.to_string(), FieldValue::Integer(record.id));
        fields.insert(ID.to_string(), FieldValue::Integer(record.id));
        fields.insert(LAST_MODIFIED.to_string(), FieldValue::ServerTimestamp);
        fields.insert(SYNC_TIMESTAMP.to_string(), FieldValue::ServerTimestamp);
        fields
    }

    /// Store the server-assigned write time locally. Failures only log: the
    /// write itself already succeeded.
    async fn adopt_server_timestamp(&self, path: &str, key: &str, mut record: LocalRecord, ts_field: &str) {
        let written = match self.remote.fetch(path, key).await {
            Ok(Some(doc)) => doc.get(LAST_MODIFIED).and_then(|v| v.timestamp_millis()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Read-back of {}/{} failed: {}", path, key, e);
                return;
            }
        };

        let Some(millis) = written else {
            tracing::warn!("Read-back of {}/{} returned no server timestamp", path, key);
            return;
        };

        if record.get(ts_field).and_then(|v| v.timestamp_millis()) == Some(millis) {
            return;
        }

        record.set(ts_field, millis);
        if let Err(e) = self.local.update(self.kind(), record).await {
            tracing::warn!("Failed to store server timestamp for {} {}: {}", self.kind(), key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::local::SqliteLocalStore;
    use crate::remote::MemoryRemoteStore;

    struct Fixture {
        local: SqliteLocalStore,
        remote: MemoryRemoteStore,
        scope: TenantScope,
    }

    impl Fixture {
        async fn new() -> Self {
            Self {
                local: SqliteLocalStore::new(create_memory_pool().await.unwrap()),
                remote: MemoryRemoteStore::new(),
                scope: TenantScope::new("companies", "company_001"),
            }
        }

        fn handler(&self, kind: EntityKind) -> EntitySyncHandler<'_> {
            EntitySyncHandler::new(kind, &self.local, &self.remote, &self.scope, HandlerOptions::default())
        }

        fn path(&self, kind: EntityKind) -> String {
            self.scope.collection_path(kind.descriptor().collection)
        }
    }

    fn fields(pairs: &[(&str, FieldValue)]) -> FieldMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn test_pull_inserts_and_counts_skips() {
        let fx = Fixture::new().await;
        let path = fx.path(EntityKind::Routes);
        fx.remote
            .seed(&path, "1", fields(&[("name", "North".into()), ("lastModified", 10i64.into())]))
            .await;
        fx.remote
            .seed(&path, "2", fields(&[("name", "".into()), ("lastModified", 10i64.into())]))
            .await;
        fx.remote
            .seed(&path, "abc", fields(&[("name", "Nowhere".into())]))
            .await;

        let report = fx.handler(EntityKind::Routes).pull().await.unwrap();
        assert_eq!(report, DomainReport { synced: 1, skipped: 2, errors: 0 });

        let route = fx.local.get_by_id(EntityKind::Routes, 1).await.unwrap().unwrap();
        assert_eq!(route.get("name"), Some(&FieldValue::from("North")));
        assert_eq!(route.get("updatedAt"), Some(&FieldValue::Integer(10)));
    }

    #[tokio::test]
    async fn test_pull_counts_malformed_documents_as_errors() {
        let fx = Fixture::new().await;
        let path = fx.path(EntityKind::Clients);
        fx.remote
            .seed(&path, "1", fields(&[("name", "a".into()), ("routeId", true.into())]))
            .await;
        fx.remote
            .seed(&path, "2", fields(&[("name", "b".into()), ("routeId", 1i64.into())]))
            .await;

        let report = fx.handler(EntityKind::Clients).pull().await.unwrap();
        assert_eq!(report, DomainReport { synced: 1, skipped: 0, errors: 1 });
    }

    #[tokio::test]
    async fn test_pull_fails_domain_on_fetch_error() {
        let fx = Fixture::new().await;
        fx.remote.fail_collection("routes").await;

        let outcome = fx.handler(EntityKind::Routes).run(SyncDirection::Pull).await;
        assert!(matches!(outcome, DomainOutcome::Failed(_)));

        let metadata = fx
            .local
            .sync_metadata(EntityKind::Routes, SyncDirection::Pull)
            .await
            .unwrap()
            .unwrap();
        assert!(metadata.error.is_some());
    }

    #[tokio::test]
    async fn test_push_injects_bookkeeping_and_reads_back() {
        let fx = Fixture::new().await;
        fx.local
            .insert_or_replace(
                EntityKind::Routes,
                LocalRecord::new(7).with("name", "North").with("updatedAt", 100i64),
            )
            .await
            .unwrap();

        let report = fx.handler(EntityKind::Routes).push().await.unwrap();
        assert_eq!(report.synced, 1);

        let doc = fx.remote.document(&fx.path(EntityKind::Routes), "7").await.unwrap();
        assert_eq!(doc["roomId"], FieldValue::Integer(7));
        assert_eq!(doc["id"], FieldValue::Integer(7));
        assert!(matches!(doc["updatedAt"], FieldValue::Timestamp(_)));
        let server_ts = doc["lastModified"].timestamp_millis().unwrap();
        assert!(matches!(doc["syncTimestamp"], FieldValue::Timestamp(_)));

        let local = fx.local.get_by_id(EntityKind::Routes, 7).await.unwrap().unwrap();
        assert_eq!(local.get("updatedAt"), Some(&FieldValue::Integer(server_ts)));
    }

    #[tokio::test]
    async fn test_push_without_read_back_leaves_local_untouched() {
        let fx = Fixture::new().await;
        let original = LocalRecord::new(3).with("name", "South").with("updatedAt", 100i64);
        fx.local.insert_or_replace(EntityKind::Routes, original.clone()).await.unwrap();

        let handler = EntitySyncHandler::new(
            EntityKind::Routes,
            &fx.local,
            &fx.remote,
            &fx.scope,
            HandlerOptions {
                read_back_timestamps: false,
            },
        );
        handler.push().await.unwrap();

        let local = fx.local.get_by_id(EntityKind::Routes, 3).await.unwrap().unwrap();
        assert_eq!(local, original);
    }

    #[tokio::test]
    async fn test_composite_pull_reuses_existing_row() {
        let fx = Fixture::new().await;
        fx.local
            .insert_or_replace(
                EntityKind::CollaboratorRoutes,
                LocalRecord::new(12)
                    .with("collaboratorId", 3i64)
                    .with("routeId", 9i64)
                    .with("assignedAt", 100i64),
            )
            .await
            .unwrap();

        fx.remote
            .seed(
                &fx.path(EntityKind::CollaboratorRoutes),
                "3_9",
                fields(&[
                    ("collaboratorId", 3i64.into()),
                    ("routeId", 9i64.into()),
                    ("responsible", true.into()),
                    ("roomId", 40i64.into()),
                    ("lastModified", 500i64.into()),
                ]),
            )
            .await;

        let report = fx.handler(EntityKind::CollaboratorRoutes).pull().await.unwrap();
        assert_eq!(report.synced, 1);

        let rows = fx.local.get_all(EntityKind::CollaboratorRoutes).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 12);
        assert_eq!(rows[0].get("responsible"), Some(&FieldValue::Bool(true)));
    }

    #[tokio::test]
    async fn test_children_follow_each_parent() {
        let fx = Fixture::new().await;
        fx.local
            .insert_or_replace(
                EntityKind::Contracts,
                LocalRecord::new(4)
                    .with("contractNumber", "2024-004")
                    .with("clientId", 2i64)
                    .with("updatedAt", 10i64),
            )
            .await
            .unwrap();
        for (id, contract) in [(1, 4i64), (2, 4), (3, 99)] {
            fx.local
                .insert_or_replace(
                    EntityKind::ContractAmendments,
                    LocalRecord::new(id)
                        .with("contractId", contract)
                        .with("amendmentNumber", format!("A-{}", id)),
                )
                .await
                .unwrap();
        }

        let report = fx.handler(EntityKind::Contracts).push().await.unwrap();
        assert_eq!(report.synced, 3);

        let contracts = fx.path(EntityKind::Contracts);
        let amendments = fx.path(EntityKind::ContractAmendments);
        assert_eq!(fx.remote.document_count(&amendments).await, 2);
        assert_eq!(
            fx.remote.write_log().await,
            vec![
                format!("{}/4", contracts),
                format!("{}/1", amendments),
                format!("{}/2", amendments),
            ]
        );

        let second = Fixture {
            local: SqliteLocalStore::new(create_memory_pool().await.unwrap()),
            remote: fx.remote,
            scope: fx.scope,
        };
        let report = second.handler(EntityKind::Contracts).pull().await.unwrap();
        assert_eq!(report.synced, 3);
        assert_eq!(
            second.local.get_all(EntityKind::ContractAmendments).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_push_continues_past_rejected_record() {
        let fx = Fixture::new().await;
        for (id, name) in [(1, "North"), (2, "South"), (3, "East")] {
            fx.local
                .insert_or_replace(EntityKind::Routes, LocalRecord::new(id).with("name", name))
                .await
                .unwrap();
        }
        let routes = fx.path(EntityKind::Routes);
        fx.remote.reject_writes(&routes, "2").await;

        let report = fx.handler(EntityKind::Routes).push().await.unwrap();
        assert_eq!(report, DomainReport { synced: 2, skipped: 0, errors: 1 });
        assert_eq!(
            fx.remote.write_log().await,
            vec![format!("{}/1", routes), format!("{}/3", routes)]
        );
    }

    #[tokio::test]
    async fn test_rejected_parent_holds_back_its_children() {
        let fx = Fixture::new().await;
        for id in [4, 5] {
            fx.local
                .insert_or_replace(
                    EntityKind::Contracts,
                    LocalRecord::new(id)
                        .with("contractNumber", format!("2024-00{}", id))
                        .with("clientId", 2i64),
                )
                .await
                .unwrap();
        }
        for (id, contract) in [(1, 4i64), (2, 5)] {
            fx.local
                .insert_or_replace(
                    EntityKind::ContractAmendments,
                    LocalRecord::new(id)
                        .with("contractId", contract)
                        .with("amendmentNumber", format!("A-{}", id)),
                )
                .await
                .unwrap();
        }
        let contracts = fx.path(EntityKind::Contracts);
        let amendments = fx.path(EntityKind::ContractAmendments);
        fx.remote.reject_writes(&contracts, "4").await;

        let report = fx.handler(EntityKind::Contracts).push().await.unwrap();
        assert_eq!(report, DomainReport { synced: 2, skipped: 0, errors: 1 });
        assert_eq!(
            fx.remote.write_log().await,
            vec![format!("{}/5", contracts), format!("{}/2", amendments)]
        );
    }

    #[tokio::test]
    async fn test_scoped_pull_falls_back_to_snake_case_key() {
        let fx = Fixture::new().await;
        fx.remote
            .seed(
                &fx.path(EntityKind::SettlementTables),
                "8",
                fields(&[
                    ("settlement_id", 5i64.into()),
                    ("table_id", 2i64.into()),
                    ("lastModified", 10i64.into()),
                ]),
            )
            .await;

        let report = fx.handler(EntityKind::SettlementTables).pull_scoped(5).await.unwrap();
        assert_eq!(report.synced, 1);

        let row = fx.local.get_by_id(EntityKind::SettlementTables, 8).await.unwrap().unwrap();
        assert_eq!(row.get("settlementId"), Some(&FieldValue::Integer(5)));
    }
}
