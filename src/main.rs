//! Rental Sync runner
//!
//! Opens the local and remote stores, runs one sync in the configured mode
//! and logs the resulting status.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rental_sync::config::SyncMode;
use rental_sync::db;
use rental_sync::remote::SqliteRemoteStore;
use rental_sync::sync::{ConnectivityProbe, HandlerOptions, StaticConnectivity, SyncCoordinator, TcpProbe};
use rental_sync::{Config, SqliteLocalStore, TenantScope};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rental_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().context("invalid sync configuration")?;

    tracing::info!("Starting Rental Sync v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Local database: {}", config.database.url);
    tracing::info!(
        "Remote tenant: {}/{}",
        config.remote.tenants_collection,
        config.remote.tenant_id
    );

    let local_pool = db::create_pool(&config.database.url)
        .await
        .with_context(|| format!("failed to open local database {}", config.database.url))?;
    let local = Arc::new(SqliteLocalStore::new(local_pool));

    let remote_pool = db::connect(&config.remote.url)
        .await
        .with_context(|| format!("failed to open remote document store {}", config.remote.url))?;
    let remote = SqliteRemoteStore::new(remote_pool);
    remote.init().await.context("failed to initialize remote document store")?;

    let connectivity: Arc<dyn ConnectivityProbe> = match &config.sync.probe_addr {
        Some(addr) => Arc::new(TcpProbe::new(
            addr.clone(),
            Duration::from_millis(config.sync.probe_timeout_ms),
        )),
        None => Arc::new(StaticConnectivity::online()),
    };

    let scope = TenantScope::new(config.remote.tenants_collection.clone(), config.remote.tenant_id.clone());
    let mut coordinator = SyncCoordinator::new(local, Arc::new(remote), scope)
        .with_connectivity(connectivity)
        .with_options(HandlerOptions {
            read_back_timestamps: config.sync.read_back_timestamps,
        });

    let outcome = match config.sync.mode {
        SyncMode::Pull => coordinator.pull().await.map(|summary| {
            tracing::info!("Pulled {} records", summary.total_synced);
        }),
        SyncMode::Push => coordinator.push().await.map(|summary| {
            tracing::info!("Pushed {} records", summary.total_synced);
        }),
        SyncMode::Both => coordinator.sync_bidirectional().await,
    };

    let status = coordinator.sync_status();
    tracing::info!(
        "Sync status: online={}, pending={}, failed={}, last_sync={:?}",
        status.is_online,
        status.pending_operations,
        status.failed_operations,
        status.last_sync_time
    );

    outcome.context("sync did not complete")?;
    Ok(())
}
