//! REST API response types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::EntityKind;
use crate::transform::pipeline::ImportReport;
use crate::validation::ValidationResult;

/// Response sent after a committed import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Always "imported"; failures use [`error_response`].
    pub status: String,

    pub entity: EntityKind,

    pub total_rows: usize,

    /// Records written by the store
    pub imported: usize,

    pub validation: ValidationResult,
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        ImportResponse {
            job_id: Uuid::new_v4().to_string(),
            status: "imported".to_string(),
            entity: report.entity,
            total_rows: report.total_rows,
            imported: report.imported,
            validation: report.validation,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

/// Error response carrying the validation outcome that blocked an import
pub fn invalid_response(validation: &ValidationResult) -> Value {
    let mut body = error_response(&format!(
        "Validation failed with {} error(s)",
        validation.errors.len()
    ));
    body["validation"] = json!(validation);
    body
}
