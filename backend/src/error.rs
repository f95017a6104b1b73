//! Error types for the Maintdesk import/export pipeline.
//!
//! - [`ParseError`] - Structural CSV failures (aggregated per line)
//! - [`RegistryError`] - Unknown entity kinds
//! - [`StoreError`] - Failures of the external record store
//! - [`ExportError`] - CSV serialization failures
//! - [`ConfigError`] - Invalid environment configuration
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Row-level validation problems are *not* errors: they are collected into a
//! [`crate::validation::ValidationResult`] and only become a
//! [`PipelineError::Invalid`] when a caller tries to commit invalid data.

use thiserror::Error;

use crate::models::EntityKind;
use crate::parser::LineError;
use crate::validation::ValidationResult;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Malformed CSV input. Carries every per-line problem found, never a partial
/// record set.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("CSV parsing errors: {}", join_lines(.errors))]
pub struct ParseError {
    pub errors: Vec<LineError>,
}

impl ParseError {
    pub fn new(errors: Vec<LineError>) -> Self {
        Self { errors }
    }

    /// Error for input that could not be read at all.
    pub fn unreadable(message: impl Into<String>) -> Self {
        Self::new(vec![LineError::new(0, message)])
    }
}

fn join_lines(errors: &[LineError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the entity schema registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No schema is registered under this name.
    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the external record store. Surfaced to the caller unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Store rejected request ({status}): {body}")]
    Status { status: u16, body: String },

    /// The store has no bulk operation for this entity kind.
    #[error("Import not supported for entity kind '{0}'")]
    Unsupported(EntityKind),

    /// Store connection settings are missing.
    #[error("Missing store configuration: {0}")]
    MissingConfig(&'static str),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing records to CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Validation failed; nothing was committed.
    #[error("Validation failed with {} error(s)", .0.errors.len())]
    Invalid(ValidationResult),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type ParseResult<T> = Result<T, ParseError>;

pub type StoreResult<T> = Result<T, StoreError>;

pub type ExportResult<T> = Result<T, ExportError>;

pub type PipelineResult<T> = Result<T, PipelineError>;

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_lists_every_line() {
        let err = ParseError::new(vec![
            LineError::new(3, "Too few fields: expected 4 fields but parsed 2"),
            LineError::new(7, "Too many fields: expected 4 fields but parsed 5"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("CSV parsing errors: "));
        assert!(msg.contains("Line 3"));
        assert!(msg.contains("Line 7"));
    }

    #[test]
    fn test_error_conversion_chain() {
        let parse_err = ParseError::unreadable("Cannot read file");
        let pipeline_err: PipelineError = parse_err.into();
        assert!(pipeline_err.to_string().contains("Cannot read file"));

        let registry_err = RegistryError::UnknownEntityKind("sales".into());
        let pipeline_err: PipelineError = registry_err.into();
        assert!(pipeline_err.to_string().contains("sales"));
    }

    #[test]
    fn test_invalid_reports_error_count() {
        let result = ValidationResult {
            is_valid: false,
            errors: vec!["Row 1: phone is required".into(), "Row 2: name is required".into()],
        };
        let err = PipelineError::Invalid(result);
        assert_eq!(err.to_string(), "Validation failed with 2 error(s)");
    }

    #[test]
    fn test_unsupported_names_entity() {
        let err = StoreError::Unsupported(EntityKind::Devices);
        assert!(err.to_string().contains("devices"));
    }
}
