//! Column projection and entity transforms.
//!
//! ```text
//! RawRecord (CSV headers) ──column map──▶ MappedRecord ──transform──▶ MappedRecord
//!                                         (canonical names)           (typed values)
//! ```

use crate::models::{MappedRecord, RawRecord};
use crate::schema::{EntitySchema, Transform};

/// Project each record through `column_map`, then run `transform` on it.
///
/// Only columns present in the raw record are copied, empty cells included.
/// Columns absent from the map are dropped. The transform receives the
/// projected record and the raw row; its return value replaces the record.
pub fn map_records(
    records: &[RawRecord],
    column_map: &[(&str, &str)],
    transform: Option<Transform>,
) -> Vec<MappedRecord> {
    records
        .iter()
        .map(|row| {
            let mapped: MappedRecord = column_map
                .iter()
                .filter_map(|(source, canonical)| {
                    row.get(*source).map(|value| (canonical.to_string(), value.clone()))
                })
                .collect();

            match transform {
                Some(transform) => transform(mapped, row),
                None => mapped,
            }
        })
        .collect()
}

/// Map records with an entity's column map and transform.
pub fn map_entity(records: &[RawRecord], schema: &EntitySchema) -> Vec<MappedRecord> {
    map_records(records, &schema.column_map(), Some(schema.transform))
}
