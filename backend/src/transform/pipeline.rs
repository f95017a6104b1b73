//! High-level import/export API.
//!
//! Combines the stages for one entity kind:
//!
//! ```text
//! bytes ─parse─▶ RawRecord[] ─validate─▶ ValidationResult
//!                     │
//!                     └──map──▶ MappedRecord[] ─commit─▶ RecordStore
//! ```
//!
//! Preview never touches the store. Import refuses to commit a record set
//! with any validation error.
//!
//! # Example
//!
//! ```rust,ignore
//! use maintdesk::{import_bytes, EntityKind, MemoryStore, ParseOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!     let bytes = std::fs::read("customers.csv")?;
//!     let report = import_bytes(&store, &bytes, EntityKind::Customers, &ParseOptions::default()).await?;
//!     println!("Imported {} customers", report.imported);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::mapper::map_entity;
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::export::{export_entity, export_filename_today, ExportArtifact};
use crate::models::{EntityKind, MappedRecord, RawRecord};
use crate::parser::{parse_bytes, parse_file, ParseOptions, ParsedCsv};
use crate::schema::schema_for;
use crate::store::RecordStore;
use crate::validation::{validate_entity_rows, ValidationResult};

/// Errors listed in the log before the rest are summarized.
const LOGGED_ERRORS: usize = 5;

/// CSV file information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParsedCsv> for CsvInfo {
    fn from(parsed: &ParsedCsv) -> Self {
        Self {
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.headers.clone(),
            row_count: parsed.records.len(),
        }
    }
}

/// Parsed, validated and mapped records, ready to show before committing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub entity: EntityKind,
    /// Every row mapped, including rows that failed validation.
    pub data: Vec<MappedRecord>,
    pub validation: ValidationResult,
    pub total_rows: usize,
    pub valid_rows: usize,
    /// Column headers as found in the input.
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_info: Option<CsvInfo>,
}

/// Outcome of a committed import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub entity: EntityKind,
    pub total_rows: usize,
    /// Records the store reports as written.
    pub imported: usize,
    pub validation: ValidationResult,
}

/// Validate and map already-parsed records.
pub fn prepare_records(records: &[RawRecord], kind: EntityKind) -> ImportPreview {
    let schema = schema_for(kind);

    log_info(format!("✔️  Validating {} {} rows...", records.len(), kind));
    let (validation, failed_rows) = validate_entity_rows(records, schema);
    report_validation(&validation);

    let data = map_entity(records, schema);
    let columns = records
        .first()
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();

    ImportPreview {
        entity: kind,
        data,
        total_rows: records.len(),
        valid_rows: records.len() - failed_rows.len(),
        validation,
        columns,
        csv_info: None,
    }
}

/// Like [`prepare_records`], keeping the parser's metadata.
pub fn prepare_parsed(parsed: &ParsedCsv, kind: EntityKind) -> ImportPreview {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows", parsed.records.len()));
    log_info(format!("📋 CSV has {} columns:", parsed.headers.len()));
    for (i, col) in parsed.headers.iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }

    let mut preview = prepare_records(&parsed.records, kind);
    preview.columns = parsed.headers.clone();
    preview.csv_info = Some(CsvInfo::from(parsed));
    preview
}

/// Parse raw CSV bytes and prepare them for `kind`.
pub fn prepare_bytes(bytes: &[u8], kind: EntityKind, options: &ParseOptions) -> PipelineResult<ImportPreview> {
    log_info("📖 Reading CSV data...");
    let parsed = parse_bytes(bytes, options).map_err(|e| {
        log_error(e.to_string());
        e
    })?;
    Ok(prepare_parsed(&parsed, kind))
}

/// Read and parse a CSV file, then prepare it for `kind`.
pub async fn prepare_file(
    path: impl AsRef<Path>,
    kind: EntityKind,
    options: &ParseOptions,
) -> PipelineResult<ImportPreview> {
    let path = path.as_ref();
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_file(path, options).await.map_err(|e| {
        log_error(e.to_string());
        e
    })?;
    Ok(prepare_parsed(&parsed, kind))
}

/// Send a valid preview to the store as one batch.
pub async fn commit<S: RecordStore>(store: &S, preview: ImportPreview) -> PipelineResult<ImportReport> {
    if !preview.validation.is_valid {
        log_warning("Import aborted: fix the errors above and try again");
        return Err(PipelineError::Invalid(preview.validation));
    }

    log_info(format!("💾 Inserting {} {} records...", preview.data.len(), preview.entity));
    let imported = store
        .bulk_insert(preview.entity, &preview.data)
        .await
        .map_err(|e| {
            log_error(format!("Store rejected import: {}", e));
            e
        })?;
    log_success(format!("Imported {} {} records", imported, preview.entity));

    Ok(ImportReport {
        entity: preview.entity,
        total_rows: preview.total_rows,
        imported,
        validation: preview.validation,
    })
}

/// Parse, validate, map and commit CSV bytes.
pub async fn import_bytes<S: RecordStore>(
    store: &S,
    bytes: &[u8],
    kind: EntityKind,
    options: &ParseOptions,
) -> PipelineResult<ImportReport> {
    let preview = prepare_bytes(bytes, kind, options)?;
    commit(store, preview).await
}

/// Parse, validate, map and commit a CSV file.
pub async fn import_file<S: RecordStore>(
    store: &S,
    path: impl AsRef<Path>,
    kind: EntityKind,
    options: &ParseOptions,
) -> PipelineResult<ImportReport> {
    let preview = prepare_file(path, kind, options).await?;
    commit(store, preview).await
}

/// Fetch every stored record of `kind` and export it as a dated CSV.
pub async fn export_from_store<S: RecordStore>(store: &S, kind: EntityKind) -> PipelineResult<ExportArtifact> {
    log_info(format!("📤 Fetching {} records...", kind));
    let records = store.fetch_all(kind).await?;
    let artifact = export_entity(&records, kind, export_filename_today(kind))?;
    log_success(format!("Exported {} records to {}", records.len(), artifact.filename));
    Ok(artifact)
}

fn report_validation(validation: &ValidationResult) {
    if validation.is_valid {
        log_success("All rows valid!");
        return;
    }
    log_error(format!("{} validation error(s)", validation.errors.len()));
    for err in validation.errors.iter().take(LOGGED_ERRORS) {
        log_info_indent(err.as_str(), 1);
    }
    if validation.errors.len() > LOGGED_ERRORS {
        log_warning(format!("... +{} more", validation.errors.len() - LOGGED_ERRORS));
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
