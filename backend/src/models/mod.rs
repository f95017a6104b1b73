//! Domain models for the import/export pipeline.
//!
//! - [`EntityKind`] - The closed set of importable/exportable record categories
//! - [`RawRecord`] - One parsed CSV row, keyed by normalized header
//! - [`MappedRecord`] - One row keyed by canonical field names, values coerced
//! - [`EntityInfo`] - Catalogue entry describing an entity kind

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// A parsed CSV row. Keys are the normalized headers in file order, values are
/// the literal cell text as JSON strings.
pub type RawRecord = Map<String, Value>;

/// A row keyed by canonical field names, ready for bulk insertion.
pub type MappedRecord = Map<String, Value>;

// =============================================================================
// Entity Kind
// =============================================================================

/// Record categories the desk can import and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customers,
    SpareParts,
    Inventory,
    Devices,
    MaintenanceRequests,
}

impl EntityKind {
    /// Every kind, in catalogue order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Customers,
        EntityKind::SpareParts,
        EntityKind::Inventory,
        EntityKind::Devices,
        EntityKind::MaintenanceRequests,
    ];

    /// Wire name, also the store table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customers => "customers",
            EntityKind::SpareParts => "spare_parts",
            EntityKind::Inventory => "inventory",
            EntityKind::Devices => "devices",
            EntityKind::MaintenanceRequests => "maintenance_requests",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Customers => "Customers",
            EntityKind::SpareParts => "Spare Parts",
            EntityKind::Inventory => "Inventory",
            EntityKind::Devices => "Devices",
            EntityKind::MaintenanceRequests => "Maintenance Requests",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EntityKind::Customers => "Import/export customer data",
            EntityKind::SpareParts => "Import/export spare parts catalog",
            EntityKind::Inventory => "Import/export inventory levels",
            EntityKind::Devices => "Import/export device information",
            EntityKind::MaintenanceRequests => "Import/export maintenance requests",
        }
    }

    /// Whether the record store offers a bulk insert for this kind.
    pub fn supports_import(&self) -> bool {
        matches!(
            self,
            EntityKind::Customers | EntityKind::SpareParts | EntityKind::Inventory
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| RegistryError::UnknownEntityKind(s.to_string()))
    }
}

// =============================================================================
// Catalogue
// =============================================================================

/// Catalogue entry for one entity kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityInfo {
    pub key: EntityKind,
    pub label: String,
    pub description: String,
    /// CSV column headers, in export order.
    pub columns: Vec<String>,
    /// Columns that must be present and non-blank on import.
    pub required_columns: Vec<String>,
    pub importable: bool,
}
