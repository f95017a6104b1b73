//! # Maintdesk - CSV import/export for a maintenance desk
//!
//! Maintdesk moves customers, spare parts, inventory, devices and maintenance
//! requests between spreadsheets and the desk's record store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Validate   │────▶│   Record    │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │  + Map      │     │   Store     │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                                                           │
//!        └──────────────────────── Export ◀──────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use maintdesk::{prepare_bytes, EntityKind, ParseOptions};
//!
//! let preview = prepare_bytes(b"name,phone,address,type\nJohn,+966501234567,Riyadh,consumer",
//!     EntityKind::Customers, &ParseOptions::default())?;
//! println!("{} of {} rows valid", preview.valid_rows, preview.total_rows);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`models`] - Entity kinds and record types
//! - [`parser`] - CSV parsing with encoding detection
//! - [`schema`] - Static per-entity column tables and transforms
//! - [`validation`] - Row validation
//! - [`transform`] - Coercion, mapping and the import pipeline
//! - [`export`] - CSV export and templates
//! - [`store`] - Record store clients
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Schemas
pub mod schema;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Export
pub mod export;

// Persistence
pub mod store;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ExportError,
    ParseError,
    PipelineError,
    RegistryError,
    ServerError,
    StoreError,
};

// =============================================================================
// Re-exports - Models and schemas
// =============================================================================

pub use models::{EntityInfo, EntityKind, MappedRecord, RawRecord};

pub use schema::{catalogue, schema_for, schema_for_name, ColumnSpec, EntitySchema};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    normalize_header,
    parse_bytes,
    parse_file,
    parse_str,
    parse_with_headers,
    LineError,
    ParseOptions,
    ParsedCsv,
};

// =============================================================================
// Re-exports - Validation, mapping, export
// =============================================================================

pub use validation::{validate, validate_entity, ValidationResult};

pub use transform::{map_entity, map_records};

pub use export::{export_entity, export_records, template_artifact, ExportArtifact};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    commit,
    export_from_store,
    import_bytes,
    import_file,
    prepare_bytes,
    prepare_file,
    prepare_parsed,
    prepare_records,
    CsvInfo,
    ImportPreview,
    ImportReport,
};

// =============================================================================
// Re-exports - Store, config, API
// =============================================================================

pub use store::{MemoryStore, RecordStore, RestStore};

pub use config::Config;

pub use api::types::{error_response, ImportResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
