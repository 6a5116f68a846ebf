//! Sync data types
//!
//! Defines the types shared across the sync engine:
//! - Entity kinds and their sync direction
//! - Status snapshots observed by the UI
//! - Queued operations
//! - Per-domain reports and persisted metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SyncError;

/// Entity domains kept in sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Routes,
    Clients,
    Tables,
    Collaborators,
    CollaboratorRoutes,
    Cycles,
    Settlements,
    SettlementTables,
    Expenses,
    ExpenseCategories,
    ExpenseTypes,
    Contracts,
    ContractAmendments,
    ContractTables,
    Signatures,
    SignatureAuditLogs,
    Goals,
    CollaboratorGoals,
    ClothStock,
    SoldTables,
    RefurbishedTables,
    TableCloths,
    Vehicles,
    Equipment,
    TableMaintenanceHistory,
    VehicleMaintenanceHistory,
    VehicleFuelHistory,
}

impl EntityKind {
    pub const ALL: [EntityKind; 27] = [
        EntityKind::Routes,
        EntityKind::Clients,
        EntityKind::Tables,
        EntityKind::Collaborators,
        EntityKind::CollaboratorRoutes,
        EntityKind::Cycles,
        EntityKind::Settlements,
        EntityKind::SettlementTables,
        EntityKind::Expenses,
        EntityKind::ExpenseCategories,
        EntityKind::ExpenseTypes,
        EntityKind::Contracts,
        EntityKind::ContractAmendments,
        EntityKind::ContractTables,
        EntityKind::Signatures,
        EntityKind::SignatureAuditLogs,
        EntityKind::Goals,
        EntityKind::CollaboratorGoals,
        EntityKind::ClothStock,
        EntityKind::SoldTables,
        EntityKind::RefurbishedTables,
        EntityKind::TableCloths,
        EntityKind::Vehicles,
        EntityKind::Equipment,
        EntityKind::TableMaintenanceHistory,
        EntityKind::VehicleMaintenanceHistory,
        EntityKind::VehicleFuelHistory,
    ];

    /// Stable storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Routes => "routes",
            EntityKind::Clients => "clients",
            EntityKind::Tables => "tables",
            EntityKind::Collaborators => "collaborators",
            EntityKind::CollaboratorRoutes => "collaborator_routes",
            EntityKind::Cycles => "cycles",
            EntityKind::Settlements => "settlements",
            EntityKind::SettlementTables => "settlement_tables",
            EntityKind::Expenses => "expenses",
            EntityKind::ExpenseCategories => "expense_categories",
            EntityKind::ExpenseTypes => "expense_types",
            EntityKind::Contracts => "contracts",
            EntityKind::ContractAmendments => "contract_amendments",
            EntityKind::ContractTables => "contract_tables",
            EntityKind::Signatures => "signatures",
            EntityKind::SignatureAuditLogs => "signature_audit_logs",
            EntityKind::Goals => "goals",
            EntityKind::CollaboratorGoals => "collaborator_goals",
            EntityKind::ClothStock => "cloth_stock",
            EntityKind::SoldTables => "sold_tables",
            EntityKind::RefurbishedTables => "refurbished_tables",
            EntityKind::TableCloths => "table_cloths",
            EntityKind::Vehicles => "vehicles",
            EntityKind::Equipment => "equipment",
            EntityKind::TableMaintenanceHistory => "table_maintenance_history",
            EntityKind::VehicleMaintenanceHistory => "vehicle_maintenance_history",
            EntityKind::VehicleFuelHistory => "vehicle_fuel_history",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SyncError::InvalidRecord(format!("unknown entity kind '{}'", s)))
    }
}

/// Which way a domain sync moved data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Pull,
    Push,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::Pull => "pull",
            SyncDirection::Push => "push",
        }
    }
}

/// Snapshot of the engine's sync state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Whether a pull or push is running
    #[serde(rename = "isSyncing")]
    pub is_syncing: bool,
    /// Completion time of the last pull or push
    #[serde(rename = "lastSyncTime")]
    pub last_sync_time: Option<DateTime<Utc>>,
    #[serde(rename = "pendingOperations")]
    pub pending_operations: u32,
    #[serde(rename = "failedOperations")]
    pub failed_operations: u32,
    #[serde(rename = "isOnline")]
    pub is_online: bool,
    /// Message of the last top-level failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Domain-level progress of the running sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    #[serde(rename = "completedDomains")]
    pub completed_domains: u32,
    #[serde(rename = "totalDomains")]
    pub total_domains: u32,
    /// 0 to 100
    pub percent: u8,
    pub message: String,
}

impl SyncProgress {
    /// Progress at the start of a run covering `total_domains` steps
    pub fn started(total_domains: u32) -> Self {
        Self {
            completed_domains: 0,
            total_domains,
            percent: 0,
            message: "Preparing sync".to_string(),
        }
    }

    /// One more domain done
    pub fn advance(&mut self, message: String) {
        self.completed_domains = (self.completed_domains + 1).min(self.total_domains);
        self.percent = if self.total_domains == 0 {
            100
        } else {
            ((self.completed_domains as f64 / self.total_domains as f64) * 100.0).round() as u8
        };
        self.message = message;
    }

    /// Mark the run finished, whatever was skipped along the way
    pub fn complete(&mut self) {
        self.completed_domains = self.total_domains;
        self.percent = 100;
        self.message = "Sync complete".to_string();
    }
}

/// Types of queued operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "create",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
        }
    }
}

/// A change captured while offline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    /// Unique operation ID
    pub id: String,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    #[serde(rename = "entityType")]
    pub entity_type: String,
    #[serde(rename = "entityId")]
    pub entity_id: String,
    /// Serialized entity
    pub payload: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "retryCount")]
    pub retry_count: u32,
}

impl SyncOperation {
    pub fn new(
        op_type: OperationType,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            op_type,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            payload,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }
}

/// Record counts for one domain pull or push
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReport {
    pub synced: u32,
    pub skipped: u32,
    pub errors: u32,
}

impl DomainReport {
    pub fn merge(&mut self, other: DomainReport) {
        self.synced += other.synced;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }
}

/// How a single domain ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainOutcome {
    Completed(DomainReport),
    Failed(String),
}

/// Result of a full pull or push across all domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub direction: SyncDirection,
    pub domains: Vec<(EntityKind, DomainOutcome)>,
    pub total_synced: u32,
    pub failed_domains: u32,
}

impl SyncSummary {
    pub fn new(direction: SyncDirection) -> Self {
        Self {
            direction,
            domains: Vec::new(),
            total_synced: 0,
            failed_domains: 0,
        }
    }

    pub fn record(&mut self, kind: EntityKind, outcome: DomainOutcome) {
        match &outcome {
            DomainOutcome::Completed(report) => self.total_synced += report.synced,
            DomainOutcome::Failed(_) => self.failed_domains += 1,
        }
        self.domains.push((kind, outcome));
    }

    pub fn outcome(&self, kind: EntityKind) -> Option<&DomainOutcome> {
        self.domains.iter().find(|(k, _)| *k == kind).map(|(_, o)| o)
    }

    /// Counts for a domain that completed
    pub fn report(&self, kind: EntityKind) -> Option<DomainReport> {
        match self.outcome(kind) {
            Some(DomainOutcome::Completed(report)) => Some(*report),
            _ => None,
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.domains
            .iter()
            .filter(|(_, o)| matches!(o, DomainOutcome::Failed(_)))
            .map(|(k, _)| *k)
    }
}

/// Persisted outcome of the last sync of a domain in one direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMetadata {
    pub entity: EntityKind,
    pub direction: SyncDirection,
    pub synced: u32,
    pub skipped: u32,
    pub errors: u32,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncMetadata {
    pub fn from_outcome(
        entity: EntityKind,
        direction: SyncDirection,
        outcome: &DomainOutcome,
        duration_ms: u64,
    ) -> Self {
        let (report, error) = match outcome {
            DomainOutcome::Completed(report) => (*report, None),
            DomainOutcome::Failed(message) => (DomainReport::default(), Some(message.clone())),
        };

        Self {
            entity,
            direction,
            synced: report.synced,
            skipped: report.skipped,
            errors: report.errors,
            duration_ms,
            completed_at: Utc::now(),
            error,
        }
    }
}
