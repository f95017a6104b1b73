//! Entity schema registry.
//!
//! Each [`EntityKind`] has one static [`EntitySchema`]: its CSV columns (with
//! canonical field names, requiredness and validators), a transform that
//! coerces mapped values, and a template row for downloadable examples.
//! Schemas are plain data; adding an entity kind means adding one entry in
//! [`entities`].

pub mod entities;
pub mod rules;

use serde_json::Value;

use crate::error::RegistryError;
use crate::models::{EntityInfo, EntityKind, MappedRecord, RawRecord};

/// Cell predicate: `(value, full_row) -> ok`.
pub type Validator = fn(&str, &RawRecord) -> bool;

/// Entity transform: receives the projected record and the raw row, returns
/// the record to keep.
pub type Transform = fn(MappedRecord, &RawRecord) -> MappedRecord;

/// One CSV column of an entity.
#[derive(Clone, Copy)]
pub struct ColumnSpec {
    /// Normalized CSV header.
    pub source: &'static str,
    /// Field name the store expects.
    pub canonical: &'static str,
    pub required: bool,
    pub validator: Option<Validator>,
}

impl ColumnSpec {
    pub const fn required(name: &'static str) -> Self {
        Self {
            source: name,
            canonical: name,
            required: true,
            validator: None,
        }
    }

    /// Attach a validator for non-empty cells.
    pub const fn check(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

impl std::fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("source", &self.source)
            .field("canonical", &self.canonical)
            .field("required", &self.required)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Static import/export configuration of one entity kind.
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Columns in declared (and export) order.
    pub columns: &'static [ColumnSpec],
    pub transform: Transform,
    /// Example row, as CSV text per source column.
    pub template: &'static [(&'static str, &'static str)],
}

impl std::fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySchema")
            .field("kind", &self.kind)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

impl EntitySchema {
    pub fn source_columns(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.source).collect()
    }

    pub fn required_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.required)
            .map(|c| c.source)
            .collect()
    }

    /// `(source column, canonical field)` pairs.
    pub fn column_map(&self) -> Vec<(&'static str, &'static str)> {
        self.columns.iter().map(|c| (c.source, c.canonical)).collect()
    }

    /// `(canonical field, source column)` pairs, for export.
    pub fn inverse_column_map(&self) -> Vec<(&'static str, &'static str)> {
        self.columns.iter().map(|c| (c.canonical, c.source)).collect()
    }

    pub fn validators(&self) -> Vec<(&'static str, Validator)> {
        self.columns
            .iter()
            .filter_map(|c| c.validator.map(|v| (c.source, v)))
            .collect()
    }

    pub fn column(&self, source: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.source == source)
    }

    /// Template row keyed by canonical field.
    pub fn template_record(&self) -> MappedRecord {
        self.template
            .iter()
            .filter_map(|(source, value)| {
                self.column(source)
                    .map(|c| (c.canonical.to_string(), Value::String((*value).to_string())))
            })
            .collect()
    }

    pub fn info(&self) -> EntityInfo {
        EntityInfo {
            key: self.kind,
            label: self.kind.label().to_string(),
            description: self.kind.description().to_string(),
            columns: self.source_columns().into_iter().map(String::from).collect(),
            required_columns: self.required_columns().into_iter().map(String::from).collect(),
            importable: self.kind.supports_import(),
        }
    }
}

/// Schema registered for `kind`.
pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Customers => &entities::CUSTOMERS,
        EntityKind::SpareParts => &entities::SPARE_PARTS,
        EntityKind::Inventory => &entities::INVENTORY,
        EntityKind::Devices => &entities::DEVICES,
        EntityKind::MaintenanceRequests => &entities::MAINTENANCE_REQUESTS,
    }
}

/// Schema registered under a wire name such as `"spare_parts"`.
pub fn schema_for_name(name: &str) -> Result<&'static EntitySchema, RegistryError> {
    name.parse::<EntityKind>().map(schema_for)
}

pub fn all_schemas() -> impl Iterator<Item = &'static EntitySchema> {
    EntityKind::ALL.into_iter().map(schema_for)
}

/// Catalogue of every entity kind, for listings.
pub fn catalogue() -> Vec<EntityInfo> {
    all_schemas().map(EntitySchema::info).collect()
}
