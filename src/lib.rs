//! Rental Sync
//!
//! Offline-first bidirectional synchronization between a local SQLite store
//! and a hierarchical remote document store, for field-collected rental and
//! billing data.

pub mod config;
pub mod db;
pub mod error;
pub mod local;
pub mod remote;
pub mod sync;

pub use config::Config;
pub use error::{DecodeError, RemoteError, Result, SyncError};
pub use local::{LocalRecord, LocalStore, SqliteLocalStore};
pub use remote::{Document, FieldMap, FieldValue, MemoryRemoteStore, RemoteStore, SqliteRemoteStore, TenantScope};
pub use sync::{SyncCoordinator, SyncProgress, SyncStatus, SyncSummary};
