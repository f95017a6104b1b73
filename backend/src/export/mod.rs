//! CSV export of canonical records.
//!
//! The inverse of the import path: canonical fields are renamed back to the
//! entity's CSV headers and written with the quoting rules the parser reads,
//! so an exported file can be imported again unchanged. Fields the schema
//! does not know are dropped.
//!
//! Nothing here touches the filesystem; callers get an [`ExportArtifact`] and
//! decide where it goes.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ExportError, ExportResult};
use crate::models::{EntityKind, MappedRecord};
use crate::schema::{schema_for, EntitySchema};

/// MIME type of every artifact.
pub const CSV_MIME: &str = "text/csv";

/// A downloadable CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: String,
    pub content: String,
}

impl ExportArtifact {
    pub fn csv(filename: impl Into<String>, content: String) -> Self {
        Self {
            filename: filename.into(),
            mime_type: CSV_MIME.to_string(),
            content,
        }
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> String {
        format!("{}; charset=utf-8", self.mime_type)
    }

    /// `Content-Disposition` header value.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename.replace('"', ""))
    }
}

/// Serialize canonical records to CSV text with the schema's headers.
pub fn export_records(records: &[MappedRecord], schema: &EntitySchema) -> ExportResult<String> {
    let inverse = schema.inverse_column_map();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .double_quote(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(inverse.iter().map(|(_, source)| *source))?;
    for record in records {
        writer.write_record(
            inverse
                .iter()
                .map(|(canonical, _)| record.get(*canonical).map(render_cell).unwrap_or_default()),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Export records of `kind` under `filename`.
pub fn export_entity(
    records: &[MappedRecord],
    kind: EntityKind,
    filename: impl Into<String>,
) -> ExportResult<ExportArtifact> {
    let content = export_records(records, schema_for(kind))?;
    Ok(ExportArtifact::csv(filename, content))
}

/// The entity's example row as a downloadable CSV.
pub fn template_artifact(kind: EntityKind) -> ExportResult<ExportArtifact> {
    let schema = schema_for(kind);
    export_entity(&[schema.template_record()], kind, template_filename(kind))
}

/// `<kind>_export_<YYYY-MM-DD>.csv`
pub fn default_export_filename(kind: EntityKind, date: NaiveDate) -> String {
    format!("{}_export_{}.csv", kind, date.format("%Y-%m-%d"))
}

/// Export filename stamped with today's UTC date.
pub fn export_filename_today(kind: EntityKind) -> String {
    default_export_filename(kind, Utc::now().date_naive())
}

/// `<kind>_template.csv`
pub fn template_filename(kind: EntityKind) -> String {
    format!("{}_template.csv", kind)
}

/// Cell text for a canonical value.
fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        // 150.0 is written as 150
        Value::Number(n) if n.is_f64() => n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string()),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
