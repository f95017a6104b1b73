//! Per-entity column tables, transforms and template rows.

use serde_json::Value;

use super::rules;
use super::{ColumnSpec, EntitySchema};
use crate::models::{EntityKind, MappedRecord, RawRecord};
use crate::transform::coerce::{is_filled, to_array, to_bool, to_date, to_float, to_integer};

// =============================================================================
// Customers
// =============================================================================

pub static CUSTOMERS: EntitySchema = EntitySchema {
    kind: EntityKind::Customers,
    columns: &[
        ColumnSpec::required("name").check(rules::non_blank),
        ColumnSpec::required("phone").check(rules::phone),
        ColumnSpec::required("address"),
        ColumnSpec::required("type").check(rules::customer_type),
    ],
    transform: customers,
    template: &[
        ("name", "John Doe"),
        ("phone", "+966501234567"),
        ("address", "Riyadh, Saudi Arabia"),
        ("type", "consumer"),
    ],
};

fn customers(mut record: MappedRecord, _raw: &RawRecord) -> MappedRecord {
    default_text(&mut record, "type", "consumer");
    record
}

// =============================================================================
// Spare Parts
// =============================================================================

pub static SPARE_PARTS: EntitySchema = EntitySchema {
    kind: EntityKind::SpareParts,
    columns: &[
        ColumnSpec::required("code").check(rules::non_blank),
        ColumnSpec::required("name").check(rules::non_blank),
        ColumnSpec::required("price").check(rules::non_negative_decimal),
        ColumnSpec::required("warranty").check(rules::boolean_flag),
    ],
    transform: spare_parts,
    template: &[
        ("code", "SP001"),
        ("name", "Samsung Galaxy S21 Screen"),
        ("price", "150.00"),
        ("warranty", "true"),
    ],
};

fn spare_parts(mut record: MappedRecord, _raw: &RawRecord) -> MappedRecord {
    set_float(&mut record, "price");
    set_bool(&mut record, "warranty");
    record
}

// =============================================================================
// Inventory
// =============================================================================

const QUANTITIES: [&str; 4] = ["qty_added", "qty_available", "qty_sold", "qty_reserved"];

pub static INVENTORY: EntitySchema = EntitySchema {
    kind: EntityKind::Inventory,
    columns: &[
        ColumnSpec::required("part_code").check(rules::non_blank),
        ColumnSpec::required("center_name").check(rules::non_blank),
        ColumnSpec::required("qty_added").check(rules::non_negative_integer),
        ColumnSpec::required("qty_available").check(rules::non_negative_integer),
        ColumnSpec::required("qty_sold").check(rules::non_negative_integer),
        ColumnSpec::required("qty_reserved").check(rules::non_negative_integer),
    ],
    transform: inventory,
    template: &[
        ("part_code", "SP001"),
        ("center_name", "Main Service Center"),
        ("qty_added", "50"),
        ("qty_available", "45"),
        ("qty_sold", "5"),
        ("qty_reserved", "0"),
    ],
};

fn inventory(mut record: MappedRecord, _raw: &RawRecord) -> MappedRecord {
    for field in QUANTITIES {
        let qty = to_integer(record.get(field));
        record.insert(field.to_string(), Value::from(qty));
    }
    record
}

// =============================================================================
// Devices
// =============================================================================

pub static DEVICES: EntitySchema = EntitySchema {
    kind: EntityKind::Devices,
    columns: &[
        ColumnSpec::required("customer_phone").check(rules::phone),
        ColumnSpec::required("name").check(rules::non_blank),
        ColumnSpec::required("serial_number").check(rules::non_blank),
        ColumnSpec::required("warranty").check(rules::boolean_flag),
        ColumnSpec::required("warranty_expiry").check(rules::date),
        ColumnSpec::required("accessories"),
    ],
    transform: devices,
    template: &[
        ("customer_phone", "+966501234567"),
        ("name", "Samsung Galaxy S21"),
        ("serial_number", "SN-S21-001"),
        ("warranty", "true"),
        ("warranty_expiry", "2024-12-31"),
        ("accessories", r#"["charger", "earphones", "case"]"#),
    ],
};

fn devices(mut record: MappedRecord, _raw: &RawRecord) -> MappedRecord {
    set_bool(&mut record, "warranty");
    let expiry = to_date(record.get("warranty_expiry"));
    record.insert("warranty_expiry".to_string(), expiry);
    let accessories = to_array(record.get("accessories"));
    record.insert("accessories".to_string(), accessories);
    record
}

// =============================================================================
// Maintenance Requests
// =============================================================================

pub static MAINTENANCE_REQUESTS: EntitySchema = EntitySchema {
    kind: EntityKind::MaintenanceRequests,
    columns: &[
        ColumnSpec::required("customer_phone").check(rules::phone),
        ColumnSpec::required("device_serial").check(rules::non_blank),
        ColumnSpec::required("issue").check(rules::non_blank),
        ColumnSpec::required("under_warranty").check(rules::boolean_flag),
        ColumnSpec::required("service_only").check(rules::boolean_flag),
        ColumnSpec::required("service_fee").check(rules::non_negative_decimal),
        ColumnSpec::required("service_fee_type").check(rules::service_fee_type),
    ],
    transform: maintenance_requests,
    template: &[
        ("customer_phone", "+966501234567"),
        ("device_serial", "SN-S21-001"),
        ("issue", "Screen cracked after drop"),
        ("under_warranty", "false"),
        ("service_only", "false"),
        ("service_fee", "0"),
        ("service_fee_type", "free"),
    ],
};

fn maintenance_requests(mut record: MappedRecord, _raw: &RawRecord) -> MappedRecord {
    set_bool(&mut record, "under_warranty");
    set_bool(&mut record, "service_only");
    set_float(&mut record, "service_fee");
    default_text(&mut record, "service_fee_type", "free");
    record
}

// =============================================================================
// Helpers
// =============================================================================

fn set_bool(record: &mut MappedRecord, field: &str) {
    let flag = to_bool(record.get(field));
    record.insert(field.to_string(), Value::Bool(flag));
}

fn set_float(record: &mut MappedRecord, field: &str) {
    let number = to_float(record.get(field));
    record.insert(field.to_string(), Value::from(number));
}

fn default_text(record: &mut MappedRecord, field: &str, fallback: &str) {
    if !is_filled(record.get(field)) {
        record.insert(field.to_string(), Value::String(fallback.to_string()));
    }
}
