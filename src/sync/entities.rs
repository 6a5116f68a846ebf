//! Descriptors for every synced domain

use super::descriptor::{EntityDescriptor, FieldDefault, FieldSpec, IdentityStrategy};
use super::types::EntityKind;

/// Top-level domains in dependency order: parents before the entities that
/// reference them, junction entities after both ends, history last. Child
/// domains are not listed; they follow each parent record.
pub const SYNC_ORDER: [EntityKind; 25] = [
    EntityKind::Routes,
    EntityKind::Clients,
    EntityKind::Tables,
    EntityKind::Collaborators,
    EntityKind::Cycles,
    EntityKind::Settlements,
    EntityKind::ExpenseCategories,
    EntityKind::ExpenseTypes,
    EntityKind::Expenses,
    EntityKind::Contracts,
    EntityKind::Signatures,
    EntityKind::SignatureAuditLogs,
    EntityKind::Goals,
    EntityKind::Vehicles,
    EntityKind::Equipment,
    EntityKind::ClothStock,
    EntityKind::SoldTables,
    EntityKind::RefurbishedTables,
    EntityKind::CollaboratorRoutes,
    EntityKind::CollaboratorGoals,
    EntityKind::ContractTables,
    EntityKind::TableCloths,
    EntityKind::TableMaintenanceHistory,
    EntityKind::VehicleMaintenanceHistory,
    EntityKind::VehicleFuelHistory,
];

const UPDATED_AT: FieldSpec = FieldSpec::timestamp("updatedAt", &["updated_at", "lastUpdated"]);
const CREATED_AT: FieldSpec = FieldSpec::timestamp("createdAt", &["created_at"]);
const ACTIVE: FieldSpec = FieldSpec::boolean("active", &["ativo"]).or(FieldDefault::Bool(true));

impl EntityKind {
    pub fn descriptor(&self) -> &'static EntityDescriptor {
        match self {
            EntityKind::Routes => &ROUTES,
            EntityKind::Clients => &CLIENTS,
            EntityKind::Tables => &TABLES,
            EntityKind::Collaborators => &COLLABORATORS,
            EntityKind::CollaboratorRoutes => &COLLABORATOR_ROUTES,
            EntityKind::Cycles => &CYCLES,
            EntityKind::Settlements => &SETTLEMENTS,
            EntityKind::SettlementTables => &SETTLEMENT_TABLES,
            EntityKind::Expenses => &EXPENSES,
            EntityKind::ExpenseCategories => &EXPENSE_CATEGORIES,
            EntityKind::ExpenseTypes => &EXPENSE_TYPES,
            EntityKind::Contracts => &CONTRACTS,
            EntityKind::ContractAmendments => &CONTRACT_AMENDMENTS,
            EntityKind::ContractTables => &CONTRACT_TABLES,
            EntityKind::Signatures => &SIGNATURES,
            EntityKind::SignatureAuditLogs => &SIGNATURE_AUDIT_LOGS,
            EntityKind::Goals => &GOALS,
            EntityKind::CollaboratorGoals => &COLLABORATOR_GOALS,
            EntityKind::ClothStock => &CLOTH_STOCK,
            EntityKind::SoldTables => &SOLD_TABLES,
            EntityKind::RefurbishedTables => &REFURBISHED_TABLES,
            EntityKind::TableCloths => &TABLE_CLOTHS,
            EntityKind::Vehicles => &VEHICLES,
            EntityKind::Equipment => &EQUIPMENT,
            EntityKind::TableMaintenanceHistory => &TABLE_MAINTENANCE_HISTORY,
            EntityKind::VehicleMaintenanceHistory => &VEHICLE_MAINTENANCE_HISTORY,
            EntityKind::VehicleFuelHistory => &VEHICLE_FUEL_HISTORY,
        }
    }
}

static ROUTES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Routes,
    collection: "routes",
    fields: &[
        FieldSpec::text("name", &[]).required(),
        FieldSpec::text("description", &[]),
        FieldSpec::text("color", &[]),
        FieldSpec::text("city", &["cities"]),
        ACTIVE,
        CREATED_AT,
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static CLIENTS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Clients,
    collection: "clients",
    fields: &[
        FieldSpec::text("name", &[]).required(),
        FieldSpec::integer("routeId", &["route_id"]).non_zero(),
        FieldSpec::text("document", &["cpf_cnpj", "cpfCnpj"]),
        FieldSpec::text("phone", &["telephone"]),
        FieldSpec::text("address", &[]),
        FieldSpec::real("pricePerPlay", &["price_per_play"]),
        FieldSpec::real("outstandingDebt", &["outstanding_debt"]),
        ACTIVE,
        CREATED_AT,
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static TABLES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Tables,
    collection: "tables",
    fields: &[
        FieldSpec::text("number", &["table_number", "tableNumber"]).required(),
        FieldSpec::integer("clientId", &["client_id"]),
        FieldSpec::text("tableType", &["table_type"]).or(FieldDefault::Text("pool")),
        FieldSpec::text("size", &[]),
        FieldSpec::integer("currentCounter", &["current_counter"]).or(FieldDefault::Integer(0)),
        FieldSpec::text("state", &["condition"]),
        ACTIVE,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: None,
    children: &[],
};

static COLLABORATORS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Collaborators,
    collection: "collaborators",
    fields: &[
        FieldSpec::text("name", &[]).required(),
        FieldSpec::text("email", &[]),
        FieldSpec::text("phone", &[]),
        FieldSpec::text("accessLevel", &["access_level"]).or(FieldDefault::Text("user")),
        FieldSpec::boolean("approved", &[]),
        ACTIVE,
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static COLLABORATOR_ROUTES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::CollaboratorRoutes,
    collection: "collaborator_routes",
    fields: &[
        FieldSpec::integer("collaboratorId", &["collaborator_id"]).non_zero(),
        FieldSpec::integer("routeId", &["route_id"]).non_zero(),
        FieldSpec::boolean("responsible", &["is_responsible"]),
        FieldSpec::timestamp("assignedAt", &["assigned_at", "assignmentDate"]),
    ],
    identity: IdentityStrategy::Composite {
        left: "collaboratorId",
        right: "routeId",
    },
    timestamp_field: Some("assignedAt"),
    children: &[],
};

static CYCLES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Cycles,
    collection: "cycles",
    fields: &[
        FieldSpec::integer("routeId", &["route_id"]).non_zero(),
        FieldSpec::integer("number", &["cycle_number", "cycleNumber"]).non_zero(),
        FieldSpec::integer("year", &[]),
        FieldSpec::timestamp("startDate", &["start_date"]),
        FieldSpec::timestamp("endDate", &["end_date"]),
        FieldSpec::text("status", &[]).or(FieldDefault::Text("open")),
        FieldSpec::real("totalCollected", &["total_collected"]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static SETTLEMENTS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Settlements,
    collection: "settlements",
    fields: &[
        FieldSpec::integer("clientId", &["client_id", "clientID"]).non_zero(),
        FieldSpec::integer("cycleId", &["cycle_id"]),
        FieldSpec::integer("routeId", &["route_id"]),
        FieldSpec::timestamp("settlementDate", &["settlement_date"]),
        FieldSpec::real("previousDebt", &["previous_debt"]),
        FieldSpec::real("totalAmount", &["total_amount"]),
        FieldSpec::real("discount", &[]),
        FieldSpec::real("amountReceived", &["amount_received"]),
        FieldSpec::real("currentDebt", &["current_debt"]),
        FieldSpec::text("paymentMethods", &["payment_methods"]),
        FieldSpec::text("notes", &["observations"]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[EntityKind::SettlementTables],
};

static SETTLEMENT_TABLES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::SettlementTables,
    collection: "settlement_tables",
    fields: &[
        FieldSpec::integer("settlementId", &["settlement_id"]).non_zero(),
        FieldSpec::integer("tableId", &["table_id"]).non_zero(),
        FieldSpec::integer("previousCounter", &["previous_counter"]).or(FieldDefault::Integer(0)),
        FieldSpec::integer("currentCounter", &["current_counter"]).or(FieldDefault::Integer(0)),
        FieldSpec::integer("plays", &["plays_count"]).or(FieldDefault::Integer(0)),
        FieldSpec::real("subtotal", &[]),
        FieldSpec::boolean("fixedFee", &["fixed_fee"]),
        FieldSpec::text("photoUrl", &["photo_url"]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::ParentScoped {
        parent: EntityKind::Settlements,
        foreign_key: &["settlementId", "settlement_id"],
    },
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static EXPENSES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Expenses,
    collection: "expenses",
    fields: &[
        FieldSpec::integer("routeId", &["route_id"]),
        FieldSpec::integer("cycleId", &["cycle_id"]),
        FieldSpec::text("description", &[]).required(),
        FieldSpec::real("amount", &["value"]),
        FieldSpec::text("category", &[]),
        FieldSpec::text("expenseType", &["expense_type"]),
        FieldSpec::timestamp("expenseDate", &["expense_date"]),
        FieldSpec::text("receiptUrl", &["receipt_url"]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static EXPENSE_CATEGORIES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::ExpenseCategories,
    collection: "expense_categories",
    fields: &[
        FieldSpec::text("name", &[]).required(),
        FieldSpec::text("description", &[]),
        ACTIVE,
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static EXPENSE_TYPES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::ExpenseTypes,
    collection: "expense_types",
    fields: &[
        FieldSpec::integer("categoryId", &["category_id"]).non_zero(),
        FieldSpec::text("name", &[]).required(),
        FieldSpec::text("description", &[]),
        ACTIVE,
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static CONTRACTS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Contracts,
    collection: "contracts",
    fields: &[
        FieldSpec::text("contractNumber", &["contract_number"]).required(),
        FieldSpec::integer("clientId", &["client_id"]).non_zero(),
        FieldSpec::text("tenantName", &["tenant_name"]),
        FieldSpec::text("tenantDocument", &["tenant_document"]),
        FieldSpec::text("billingMode", &["billing_mode"]).or(FieldDefault::Text("percentage")),
        FieldSpec::real("tenantShare", &["tenant_share"]),
        FieldSpec::real("monthlyFee", &["monthly_fee"]),
        FieldSpec::timestamp("startDate", &["start_date"]),
        FieldSpec::timestamp("endDate", &["end_date"]),
        FieldSpec::text("status", &[]).or(FieldDefault::Text("active")),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[EntityKind::ContractAmendments],
};

static CONTRACT_AMENDMENTS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::ContractAmendments,
    collection: "contract_amendments",
    fields: &[
        FieldSpec::integer("contractId", &["contract_id"]).non_zero(),
        FieldSpec::text("amendmentNumber", &["amendment_number"]).required(),
        FieldSpec::text("amendmentType", &["amendment_type"]).or(FieldDefault::Text("addition")),
        FieldSpec::text("notes", &["observations"]),
        FieldSpec::text("tenantSignature", &["tenant_signature"]),
        FieldSpec::timestamp("signedAt", &["signed_at", "signatureDate"]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::ParentScoped {
        parent: EntityKind::Contracts,
        foreign_key: &["contractId", "contract_id"],
    },
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static CONTRACT_TABLES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::ContractTables,
    collection: "contract_tables",
    fields: &[
        FieldSpec::integer("contractId", &["contract_id"]).non_zero(),
        FieldSpec::integer("tableId", &["table_id"]).non_zero(),
        FieldSpec::text("tableType", &["table_type"]),
        FieldSpec::real("depositAmount", &["deposit_amount"]),
        FieldSpec::timestamp("linkedAt", &["linked_at"]),
    ],
    identity: IdentityStrategy::Composite {
        left: "contractId",
        right: "tableId",
    },
    timestamp_field: Some("linkedAt"),
    children: &[],
};

static SIGNATURES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Signatures,
    collection: "signatures",
    fields: &[
        FieldSpec::integer("contractId", &["contract_id"]),
        FieldSpec::text("signerName", &["signer_name"]).required(),
        FieldSpec::text("signerDocument", &["signer_document"]),
        FieldSpec::text("signatureData", &["signature_data"]).required(),
        FieldSpec::text("signatureHash", &["signature_hash"]),
        FieldSpec::text("deviceId", &["device_id"]),
        FieldSpec::timestamp("signedAt", &["signed_at"]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static SIGNATURE_AUDIT_LOGS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::SignatureAuditLogs,
    collection: "signature_audit_logs",
    fields: &[
        FieldSpec::integer("signatureId", &["signature_id"]),
        FieldSpec::integer("contractId", &["contract_id"]),
        FieldSpec::text("action", &["operation"]).required(),
        FieldSpec::text("documentHash", &["document_hash"]),
        FieldSpec::text("deviceId", &["device_id"]),
        FieldSpec::text("ipAddress", &["ip_address"]),
        FieldSpec::boolean("valid", &["is_valid"]).or(FieldDefault::Bool(true)),
        FieldSpec::timestamp("loggedAt", &["logged_at", "timestamp"]),
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("loggedAt"),
    children: &[],
};

static GOALS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Goals,
    collection: "goals",
    fields: &[
        FieldSpec::text("name", &["title"]).required(),
        FieldSpec::integer("routeId", &["route_id"]),
        FieldSpec::integer("cycleId", &["cycle_id"]),
        FieldSpec::text("goalType", &["goal_type"]).or(FieldDefault::Text("revenue")),
        FieldSpec::real("targetValue", &["target_value"]),
        FieldSpec::real("currentValue", &["current_value"]),
        ACTIVE,
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static COLLABORATOR_GOALS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::CollaboratorGoals,
    collection: "collaborator_goals",
    fields: &[
        FieldSpec::integer("collaboratorId", &["collaborator_id"]).non_zero(),
        FieldSpec::integer("cycleId", &["cycle_id"]),
        FieldSpec::integer("routeId", &["route_id"]),
        FieldSpec::text("goalType", &["goal_type"]),
        FieldSpec::real("targetValue", &["target_value"]),
        FieldSpec::real("achievedValue", &["achieved_value"]),
        ACTIVE,
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static CLOTH_STOCK: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::ClothStock,
    collection: "cloth_stock",
    fields: &[
        FieldSpec::text("code", &["cloth_code"]).required(),
        FieldSpec::text("color", &[]),
        FieldSpec::text("size", &[]),
        FieldSpec::text("material", &[]),
        FieldSpec::integer("quantity", &[]).or(FieldDefault::Integer(0)),
        FieldSpec::boolean("available", &["is_available"]).or(FieldDefault::Bool(true)),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static SOLD_TABLES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::SoldTables,
    collection: "sold_tables",
    fields: &[
        FieldSpec::integer("originalTableId", &["original_table_id"]),
        FieldSpec::text("tableNumber", &["table_number"]).required(),
        FieldSpec::text("buyerName", &["buyer_name"]).required(),
        FieldSpec::text("buyerDocument", &["buyer_document"]),
        FieldSpec::real("salePrice", &["sale_price"]),
        FieldSpec::timestamp("saleDate", &["sale_date"]),
        FieldSpec::text("notes", &["observations"]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static REFURBISHED_TABLES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::RefurbishedTables,
    collection: "refurbished_tables",
    fields: &[
        FieldSpec::integer("tableId", &["table_id"]),
        FieldSpec::text("tableNumber", &["table_number"]).required(),
        FieldSpec::boolean("paintingDone", &["painting_done"]),
        FieldSpec::boolean("clothReplaced", &["cloth_replaced"]),
        FieldSpec::boolean("cushionsReplaced", &["cushions_replaced"]),
        FieldSpec::text("notes", &["observations"]),
        FieldSpec::timestamp("refurbishedAt", &["refurbished_at", "refurbishmentDate"]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static TABLE_CLOTHS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::TableCloths,
    collection: "table_cloths",
    fields: &[
        FieldSpec::integer("tableId", &["table_id"]).non_zero(),
        FieldSpec::integer("clothId", &["cloth_id"]).non_zero(),
        FieldSpec::boolean("current", &["is_current"]).or(FieldDefault::Bool(true)),
        FieldSpec::timestamp("installedAt", &["installed_at"]),
        FieldSpec::text("notes", &["observations"]),
    ],
    identity: IdentityStrategy::Composite {
        left: "tableId",
        right: "clothId",
    },
    timestamp_field: Some("installedAt"),
    children: &[],
};

static VEHICLES: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Vehicles,
    collection: "vehicles",
    fields: &[
        FieldSpec::text("plate", &["license_plate"]).required(),
        FieldSpec::text("model", &[]),
        FieldSpec::text("brand", &[]),
        FieldSpec::integer("year", &[]),
        FieldSpec::integer("mileage", &["odometer"]).or(FieldDefault::Integer(0)),
        ACTIVE,
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static EQUIPMENT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Equipment,
    collection: "equipment",
    fields: &[
        FieldSpec::text("name", &[]).required(),
        FieldSpec::text("description", &[]),
        FieldSpec::integer("quantity", &[]).or(FieldDefault::Integer(0)),
        FieldSpec::text("location", &[]),
        UPDATED_AT,
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("updatedAt"),
    children: &[],
};

static TABLE_MAINTENANCE_HISTORY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::TableMaintenanceHistory,
    collection: "table_maintenance_history",
    fields: &[
        FieldSpec::integer("tableId", &["table_id"]).non_zero(),
        FieldSpec::text("maintenanceType", &["maintenance_type"]).required(),
        FieldSpec::text("description", &[]),
        FieldSpec::real("cost", &[]),
        FieldSpec::text("technician", &["responsible"]),
        FieldSpec::timestamp("performedAt", &["performed_at", "maintenanceDate"]),
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("performedAt"),
    children: &[],
};

static VEHICLE_MAINTENANCE_HISTORY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::VehicleMaintenanceHistory,
    collection: "vehicle_maintenance_history",
    fields: &[
        FieldSpec::integer("vehicleId", &["vehicle_id"]).non_zero(),
        FieldSpec::text("maintenanceType", &["maintenance_type"]).required(),
        FieldSpec::text("description", &[]),
        FieldSpec::real("cost", &["amount"]),
        FieldSpec::integer("mileage", &["odometer"]),
        FieldSpec::text("workshop", &[]),
        FieldSpec::timestamp("performedAt", &["performed_at", "maintenanceDate"]),
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("performedAt"),
    children: &[],
};

static VEHICLE_FUEL_HISTORY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::VehicleFuelHistory,
    collection: "vehicle_fuel_history",
    fields: &[
        FieldSpec::integer("vehicleId", &["vehicle_id"]).non_zero(),
        FieldSpec::real("liters", &[]),
        FieldSpec::real("pricePerLiter", &["price_per_liter"]),
        FieldSpec::real("totalCost", &["total_cost"]),
        FieldSpec::integer("mileage", &["odometer"]),
        FieldSpec::text("station", &["gas_station"]),
        FieldSpec::timestamp("fueledAt", &["fueled_at", "refuelDate"]),
    ],
    identity: IdentityStrategy::Simple,
    timestamp_field: Some("fueledAt"),
    children: &[],
};
