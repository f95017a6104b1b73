//! Transformation module.
//!
//! - Coerce: lenient text to typed value conversions
//! - Mapper: CSV headers to canonical fields, plus entity transforms
//! - Pipeline: preview, import and export orchestration

pub mod coerce;
pub mod mapper;
pub mod pipeline;

pub use mapper::{map_entity, map_records};
pub use pipeline::*;
