//! Sync coordinator
//!
//! Runs ordered pull, ordered push and bidirectional sync over every domain
//! and owns the shared `SyncStatus`. Status and domain progress live in
//! `watch` channels: the coordinator is their only writer, observers take
//! snapshots or subscribe.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{Result, SyncError};
use crate::local::LocalStore;
use crate::remote::{RemoteStore, TenantScope};

use super::connectivity::{ConnectivityProbe, StaticConnectivity};
use super::entities::SYNC_ORDER;
use super::handler::{EntitySyncHandler, HandlerOptions};
use super::queue::{LoggingOperationQueue, OperationQueue};
use super::types::{EntityKind, SyncDirection, SyncOperation, SyncProgress, SyncStatus, SyncSummary};

pub struct SyncCoordinator {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    connectivity: Arc<dyn ConnectivityProbe>,
    queue: Box<dyn OperationQueue>,
    scope: TenantScope,
    options: HandlerOptions,
    status: watch::Sender<SyncStatus>,
    progress: watch::Sender<SyncProgress>,
}

impl SyncCoordinator {
    /// Coordinator that assumes connectivity and uses the logging queue
    pub fn new(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteStore>, scope: TenantScope) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        let (progress, _) = watch::channel(SyncProgress::default());
        Self {
            local,
            remote,
            connectivity: Arc::new(StaticConnectivity::online()),
            queue: Box::new(LoggingOperationQueue),
            scope,
            options: HandlerOptions::default(),
            status,
            progress,
        }
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn ConnectivityProbe>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_queue(mut self, queue: Box<dyn OperationQueue>) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_options(mut self, options: HandlerOptions) -> Self {
        self.options = options;
        self
    }

    /// Snapshot of the current status
    pub fn sync_status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Snapshot of the running (or last finished) sync's domain progress
    pub fn sync_progress(&self) -> SyncProgress {
        self.progress.borrow().clone()
    }

    /// Receiver notified after every domain
    pub fn subscribe_progress(&self) -> watch::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    pub fn clear_error(&self) {
        self.status.send_modify(|s| s.error = None);
    }

    pub async fn is_online(&self) -> bool {
        self.connectivity.is_online().await
    }

    pub async fn enqueue_operation(&self, op: SyncOperation) -> Result<()> {
        self.queue.enqueue(op).await
    }

    pub async fn process_sync_queue(&self) -> Result<()> {
        self.queue.process().await
    }

    /// Whether the remote already holds data for this tenant, judged by the
    /// routes collection
    pub async fn has_remote_data(&self) -> bool {
        if !self.is_online().await {
            return false;
        }

        let path = self.scope.collection_path(EntityKind::Routes.descriptor().collection);
        match self.remote.fetch_all(&path).await {
            Ok(docs) => !docs.is_empty(),
            Err(e) => {
                tracing::warn!("Could not check remote data at {}: {}", path, e);
                false
            }
        }
    }

    /// Pull every domain in dependency order. Domain failures are counted in
    /// the summary and status, never returned.
    pub async fn pull(&mut self) -> Result<SyncSummary> {
        self.start_progress(SYNC_ORDER.len());
        let result = self.run_pull().await;
        if result.is_ok() {
            self.finish_progress();
        }
        result
    }

    async fn run_pull(&self) -> Result<SyncSummary> {
        self.begin();

        if !self.is_online().await {
            tracing::warn!("Connectivity probe reports offline; attempting pull anyway");
        }

        tracing::info!("Starting pull for {}/{}", self.scope.tenants_collection, self.scope.tenant_id);
        let result = self.run_domains(SyncDirection::Pull).await;

        match result {
            Ok(summary) => {
                tracing::info!(
                    "Pull complete: {} records synced, {} domains failed",
                    summary.total_synced,
                    summary.failed_domains
                );
                self.status.send_modify(|s| {
                    s.is_syncing = false;
                    s.last_sync_time = Some(Utc::now());
                    s.failed_operations = summary.failed_domains;
                });
                Ok(summary)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Push every domain in dependency order. Refuses to start when offline.
    pub async fn push(&mut self) -> Result<SyncSummary> {
        self.start_progress(SYNC_ORDER.len());
        let result = self.run_push().await;
        if result.is_ok() {
            self.finish_progress();
        }
        result
    }

    async fn run_push(&self) -> Result<SyncSummary> {
        if !self.is_online().await {
            tracing::warn!("Push aborted: device offline");
            self.status.send_modify(|s| {
                s.is_online = false;
                s.error = Some(SyncError::Offline.to_string());
            });
            return Err(SyncError::Offline);
        }

        self.begin();

        if let Err(e) = self.queue.process().await {
            tracing::warn!("Operation queue processing failed: {}", e);
        }

        let summary = match self.run_domains(SyncDirection::Push).await {
            Ok(summary) => summary,
            Err(e) => return Err(self.fail(e)),
        };

        let pending = match self.local.pending_operation_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Could not read pending operation count: {}", e);
                0
            }
        };
        let failed = match self.local.failed_operation_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Could not read failed operation count: {}", e);
                0
            }
        };

        tracing::info!(
            "Push complete: {} records synced, {} domains failed",
            summary.total_synced,
            summary.failed_domains
        );
        self.status.send_modify(|s| {
            s.is_syncing = false;
            s.last_sync_time = Some(Utc::now());
            s.pending_operations = pending;
            s.failed_operations = failed;
        });

        Ok(summary)
    }

    /// Push then pull. Pull runs even when push failed; both sides' effects
    /// stay applied.
    pub async fn sync_bidirectional(&mut self) -> Result<()> {
        self.start_progress(SYNC_ORDER.len() * 2);

        let push_ok = match self.run_push().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Push side of bidirectional sync failed: {}", e);
                false
            }
        };

        let pull_ok = match self.run_pull().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Pull side of bidirectional sync failed: {}", e);
                false
            }
        };

        if push_ok && pull_ok {
            self.finish_progress();
            return Ok(());
        }

        let err = SyncError::PartialSync { push_ok, pull_ok };
        self.status.send_modify(|s| s.error = Some(err.to_string()));
        Err(err)
    }

    fn start_progress(&self, total_domains: usize) {
        self.progress.send_replace(SyncProgress::started(total_domains as u32));
    }

    fn finish_progress(&self) {
        self.progress.send_modify(|p| p.complete());
    }

    fn begin(&self) {
        self.status.send_modify(|s| {
            s.is_syncing = true;
            s.is_online = true;
            s.error = None;
        });
    }

    fn fail(&self, err: SyncError) -> SyncError {
        tracing::error!("Sync failed: {}", err);
        self.status.send_modify(|s| {
            s.is_syncing = false;
            s.error = Some(err.to_string());
        });
        err
    }

    async fn run_domains(&self, direction: SyncDirection) -> Result<SyncSummary> {
        let mut summary = SyncSummary::new(direction);

        for kind in SYNC_ORDER {
            let handler = EntitySyncHandler::new(
                kind,
                self.local.as_ref(),
                self.remote.as_ref(),
                &self.scope,
                self.options,
            );
            let outcome = handler.run(direction).await;
            let verb = match direction {
                SyncDirection::Pull => "Pulled",
                SyncDirection::Push => "Pushed",
            };
            self.progress.send_modify(|p| p.advance(format!("{} {}", verb, kind)));
            summary.record(kind, outcome);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::local::{LocalRecord, SqliteLocalStore};
    use crate::remote::{FieldMap, FieldValue, MemoryRemoteStore};
    use crate::sync::{DomainOutcome, OperationType};

    struct Setup {
        local: Arc<SqliteLocalStore>,
        remote: Arc<MemoryRemoteStore>,
        connectivity: Arc<StaticConnectivity>,
        coordinator: SyncCoordinator,
    }

    async fn setup() -> Setup {
        let local = Arc::new(SqliteLocalStore::new(create_memory_pool().await.unwrap()));
        let remote = Arc::new(MemoryRemoteStore::new());
        let connectivity = Arc::new(StaticConnectivity::online());
        let coordinator = SyncCoordinator::new(
            local.clone(),
            remote.clone(),
            TenantScope::new("companies", "company_001"),
        )
        .with_connectivity(connectivity.clone());

        Setup {
            local,
            remote,
            connectivity,
            coordinator,
        }
    }

    fn route_doc(name: &str, last_modified: i64) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), FieldValue::from(name));
        fields.insert("lastModified".to_string(), FieldValue::Integer(last_modified));
        fields
    }

    #[tokio::test]
    async fn test_initial_status() {
        let s = setup().await;
        let status = s.coordinator.sync_status();
        assert!(!status.is_syncing);
        assert!(status.last_sync_time.is_none());
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_pull_brackets_status() {
        let mut s = setup().await;
        let mut rx = s.coordinator.subscribe();

        let summary = s.coordinator.pull().await.unwrap();
        assert_eq!(summary.domains.len(), SYNC_ORDER.len());
        assert_eq!(summary.failed_domains, 0);

        assert!(rx.has_changed().unwrap());
        let status = rx.borrow_and_update().clone();
        assert!(!status.is_syncing);
        assert!(status.is_online);
        assert!(status.last_sync_time.is_some());
    }

    #[tokio::test]
    async fn test_pull_proceeds_when_probe_reports_offline() {
        let mut s = setup().await;
        s.remote
            .seed("companies/company_001/routes", "1", route_doc("North", 10))
            .await;
        s.connectivity.set_online(false);

        let summary = s.coordinator.pull().await.unwrap();
        assert_eq!(summary.total_synced, 1);
        assert!(s.local.get_by_id(EntityKind::Routes, 1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_domains_reported_in_status() {
        let mut s = setup().await;
        s.remote.fail_collection("clients").await;
        s.remote.fail_collection("vehicles").await;

        let summary = s.coordinator.pull().await.unwrap();
        assert_eq!(summary.failed_domains, 2);
        assert!(matches!(
            summary.outcome(EntityKind::Clients),
            Some(DomainOutcome::Failed(_))
        ));
        assert_eq!(s.coordinator.sync_status().failed_operations, 2);
        assert!(s.coordinator.sync_status().error.is_none());
    }

    #[tokio::test]
    async fn test_offline_push_sets_error_without_bracket() {
        let mut s = setup().await;
        s.local
            .insert_or_replace(EntityKind::Routes, LocalRecord::new(1).with("name", "North"))
            .await
            .unwrap();
        s.connectivity.set_online(false);

        let err = s.coordinator.push().await.unwrap_err();
        assert!(matches!(err, SyncError::Offline));

        let status = s.coordinator.sync_status();
        assert_eq!(status.error.as_deref(), Some("Device offline"));
        assert!(!status.is_online);
        assert!(!status.is_syncing);
        assert!(status.last_sync_time.is_none());
        assert_eq!(s.remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_push_counters_come_from_local_store() {
        let mut s = setup().await;
        let pending = SyncOperation::new(OperationType::Create, "clients", "1", Vec::new());
        let failed = SyncOperation::new(OperationType::Update, "routes", "2", Vec::new());
        s.local.record_operation(&pending).await.unwrap();
        s.local.record_operation(&failed).await.unwrap();
        crate::sync::SyncStateRepository::new(s.local.pool())
            .mark_failed(&failed.id, "rejected")
            .await
            .unwrap();

        s.coordinator.push().await.unwrap();

        let status = s.coordinator.sync_status();
        assert_eq!(status.pending_operations, 1);
        assert_eq!(status.failed_operations, 1);
    }

    #[tokio::test]
    async fn test_bidirectional_reports_failing_side() {
        let mut s = setup().await;
        s.connectivity.set_online(false);

        let err = s.coordinator.sync_bidirectional().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::PartialSync {
                push_ok: false,
                pull_ok: true
            }
        ));
        assert_eq!(
            s.coordinator.sync_status().error.as_deref(),
            Some("Push failed; pull succeeded")
        );

        let progress = s.coordinator.sync_progress();
        assert_eq!(progress.total_domains as usize, SYNC_ORDER.len() * 2);
        assert_eq!(progress.completed_domains as usize, SYNC_ORDER.len());
        assert_eq!(progress.percent, 50);

        s.coordinator.clear_error();
        assert!(s.coordinator.sync_status().error.is_none());
    }

    #[tokio::test]
    async fn test_pull_progress_is_monotonic_and_completes() {
        let mut s = setup().await;
        s.remote.fail_collection("clients").await;
        let mut rx = s.coordinator.subscribe_progress();
        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                seen.push(rx.borrow_and_update().clone());
            }
            seen
        });

        s.coordinator.pull().await.unwrap();
        let last = s.coordinator.sync_progress();
        assert_eq!(last.percent, 100);
        assert_eq!(last.completed_domains as usize, SYNC_ORDER.len());
        assert_eq!(last.total_domains as usize, SYNC_ORDER.len());

        drop(s);
        let seen = collector.await.unwrap();
        assert!(!seen.is_empty());
        assert!(seen
            .windows(2)
            .all(|w| w[0].percent <= w[1].percent && w[0].completed_domains <= w[1].completed_domains));
        assert_eq!(seen.last().map(|p| p.percent), Some(100));
    }

    #[tokio::test]
    async fn test_bidirectional_progress_spans_both_directions() {
        let mut s = setup().await;
        s.coordinator.sync_bidirectional().await.unwrap();

        let progress = s.coordinator.sync_progress();
        assert_eq!(progress.total_domains as usize, SYNC_ORDER.len() * 2);
        assert_eq!(progress.completed_domains, progress.total_domains);
        assert_eq!(progress.percent, 100);
    }

    #[tokio::test]
    async fn test_has_remote_data() {
        let s = setup().await;
        assert!(!s.coordinator.has_remote_data().await);

        s.remote
            .seed("companies/company_001/routes", "1", route_doc("North", 10))
            .await;
        assert!(s.coordinator.has_remote_data().await);

        s.connectivity.set_online(false);
        assert!(!s.coordinator.has_remote_data().await);
    }

    #[tokio::test]
    async fn test_queue_entry_points_delegate() {
        let s = setup().await;
        let op = SyncOperation::new(OperationType::Delete, "expenses", "5", Vec::new());
        s.coordinator.enqueue_operation(op).await.unwrap();
        s.coordinator.process_sync_queue().await.unwrap();
    }
}
