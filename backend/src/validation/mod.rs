//! Row validation for parsed CSV records.
//!
//! Checks, in order:
//!
//! 1. the input is not empty,
//! 2. every required column exists (checked once, against the first record),
//! 3. per row, every required cell is filled in,
//! 4. per row, every filled cell with a validator passes it.
//!
//! All problems are collected, never fail-fast, so a user can fix a file in
//! one pass. Rows are numbered from 1.
//!
//! # Example
//!
//! ```rust,ignore
//! use maintdesk::{schema_for, validate_entity, EntityKind};
//!
//! let result = validate_entity(&records, schema_for(EntityKind::Customers));
//! if !result.is_valid {
//!     for err in &result.errors {
//!         eprintln!("{}", err);
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::RawRecord;
use crate::schema::{EntitySchema, Validator};
use crate::transform::coerce::as_text;

/// Message for an empty record set.
pub const NO_DATA: &str = "No data found in CSV file";

/// Outcome of validating a record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Human-readable problems, in discovery order.
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_issues(issues: &[Issue]) -> Self {
        Self {
            is_valid: issues.is_empty(),
            errors: issues.iter().map(|i| i.message.clone()).collect(),
        }
    }
}

/// A problem, optionally tied to a 1-based row.
#[derive(Debug, Clone)]
struct Issue {
    row: Option<usize>,
    message: String,
}

impl Issue {
    fn global(message: impl Into<String>) -> Self {
        Self {
            row: None,
            message: message.into(),
        }
    }

    fn row(row: usize, message: String) -> Self {
        Self {
            row: Some(row),
            message,
        }
    }
}

/// Validate records against required columns and per-column validators.
pub fn validate(
    records: &[RawRecord],
    required_columns: &[&str],
    validators: &[(&str, Validator)],
) -> ValidationResult {
    ValidationResult::from_issues(&collect_issues(records, required_columns, validators))
}

/// Validate records against an entity schema.
pub fn validate_entity(records: &[RawRecord], schema: &EntitySchema) -> ValidationResult {
    validate(records, &schema.required_columns(), &schema.validators())
}

/// Like [`validate_entity`], also returning the rows that had a problem.
///
/// When the problem is global (no data, missing columns) every row counts as
/// failed.
pub fn validate_entity_rows(
    records: &[RawRecord],
    schema: &EntitySchema,
) -> (ValidationResult, BTreeSet<usize>) {
    let issues = collect_issues(records, &schema.required_columns(), &schema.validators());
    let rows = if issues.iter().any(|i| i.row.is_none()) {
        (1..=records.len()).collect()
    } else {
        issues.iter().filter_map(|i| i.row).collect()
    };
    (ValidationResult::from_issues(&issues), rows)
}

fn collect_issues(
    records: &[RawRecord],
    required_columns: &[&str],
    validators: &[(&str, Validator)],
) -> Vec<Issue> {
    let Some(first) = records.first() else {
        return vec![Issue::global(NO_DATA)];
    };

    let mut issues = Vec::new();

    let missing: Vec<&str> = required_columns
        .iter()
        .copied()
        .filter(|col| !first.contains_key(*col))
        .collect();
    if !missing.is_empty() {
        issues.push(Issue::global(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    for (index, row) in records.iter().enumerate() {
        let row_number = index + 1;

        for column in required_columns {
            let filled = cell(row, column).is_some_and(|v| !v.trim().is_empty());
            if !filled {
                issues.push(Issue::row(row_number, format!("Row {}: {} is required", row_number, column)));
            }
        }

        for (column, validator) in validators {
            let Some(value) = cell(row, column).filter(|v| !v.is_empty()) else {
                continue;
            };
            if !validator(&value, row) {
                issues.push(Issue::row(row_number, format!("Row {}: Invalid {} value", row_number, column)));
            }
        }
    }

    issues
}

fn cell(row: &RawRecord, column: &str) -> Option<String> {
    row.get(column).and_then(as_text)
}
