//! Offline-first synchronization engine
//!
//! Moves entity records between the local store and the remote document
//! store:
//! - `SyncCoordinator` runs ordered pull, push and bidirectional sync
//! - `EntitySyncHandler` is the generic per-domain engine
//! - `IdentityMapper` and `ConflictResolver` decide per-record actions

mod conflict;
mod connectivity;
mod coordinator;
mod decode;
mod descriptor;
mod entities;
mod handler;
mod identity;
mod queue;
mod store;
mod types;

pub use conflict::{ConflictResolver, Resolution};
pub use connectivity::{ConnectivityProbe, StaticConnectivity, TcpProbe};
pub use coordinator::SyncCoordinator;
pub use decode::{decode_fields, document_id, LAST_MODIFIED, ROOM_ID, SYNC_TIMESTAMP};
pub use descriptor::{EntityDescriptor, FieldDefault, FieldKind, FieldSpec, IdentityStrategy, Requirement};
pub use entities::SYNC_ORDER;
pub use handler::{EntitySyncHandler, HandlerOptions};
pub use identity::IdentityMapper;
pub use queue::{LoggingOperationQueue, OperationQueue};
pub use store::SyncStateRepository;
pub use types::*;
