//! Record store: the external service that persists imported records.
//!
//! The pipeline only hands finished batches to a [`RecordStore`] and surfaces
//! whatever it answers. Conflict handling and transactions belong to the
//! store. Each import batch is one call, never chunked or retried.
//!
//! - [`RestStore`] - hosted REST backend (PostgREST dialect)
//! - [`MemoryStore`] - in-process store for dry runs and tests

pub mod rest;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{StoreError, StoreResult};
use crate::models::{EntityKind, MappedRecord};

pub use rest::RestStore;

/// Bulk insert and fetch of canonical records.
pub trait RecordStore {
    /// Insert a batch; returns how many records the store accepted.
    fn bulk_insert(
        &self,
        kind: EntityKind,
        records: &[MappedRecord],
    ) -> impl Future<Output = StoreResult<usize>> + Send;

    /// Every stored record of `kind`, for export.
    fn fetch_all(&self, kind: EntityKind) -> impl Future<Output = StoreResult<Vec<MappedRecord>>> + Send;
}

/// Reject kinds the store has no bulk insert for.
pub fn ensure_importable(kind: EntityKind) -> StoreResult<()> {
    if kind.supports_import() {
        Ok(())
    } else {
        Err(StoreError::Unsupported(kind))
    }
}

/// Store keeping records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<EntityKind, Vec<MappedRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for `kind`.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Seed records without the import checks.
    pub fn seed(&self, kind: EntityKind, records: Vec<MappedRecord>) {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .extend(records);
    }
}

impl RecordStore for MemoryStore {
    async fn bulk_insert(&self, kind: EntityKind, records: &[MappedRecord]) -> StoreResult<usize> {
        ensure_importable(kind)?;
        self.seed(kind, records.to_vec());
        Ok(records.len())
    }

    async fn fetch_all(&self, kind: EntityKind) -> StoreResult<Vec<MappedRecord>> {
        Ok(self
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }
}
