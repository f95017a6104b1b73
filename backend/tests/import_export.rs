//! End-to-end checks through the public API: CSV text in, canonical records
//! out, and back again.

use maintdesk::{
    export_records, import_bytes, map_entity, parse_str, prepare_bytes, schema_for, validate,
    validate_entity, EntityKind, MappedRecord, MemoryStore, ParseOptions, PipelineError, RawRecord,
    RecordStore,
};
use serde_json::{json, Value};

fn records(value: Value) -> Vec<MappedRecord> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
}

fn parse(csv: &str) -> Vec<RawRecord> {
    parse_str(csv, &ParseOptions::default()).unwrap()
}

/// Canonical records of every kind, already in transformed form.
fn fixtures() -> Vec<(EntityKind, Vec<MappedRecord>)> {
    vec![
        (
            EntityKind::Customers,
            records(json!([
                { "name": "John Doe", "phone": "+966501234567", "address": "Riyadh, Saudi Arabia", "type": "consumer" },
                { "name": "Parts \"R\" Us", "phone": "+966501234568", "address": "Jeddah", "type": "distributor" }
            ])),
        ),
        (
            EntityKind::SpareParts,
            records(json!([
                { "code": "SP001", "name": "Screen", "price": 150.0, "warranty": true },
                { "code": "SP002", "name": "Battery", "price": 49.5, "warranty": false }
            ])),
        ),
        (
            EntityKind::Inventory,
            records(json!([
                { "part_code": "SP001", "center_name": "Main Service Center",
                  "qty_added": 50, "qty_available": 45, "qty_sold": 5, "qty_reserved": 0 }
            ])),
        ),
        (
            EntityKind::Devices,
            records(json!([
                { "customer_phone": "+966501234567", "name": "Samsung Galaxy S21", "serial_number": "SN-1",
                  "warranty": true, "warranty_expiry": "2024-12-31", "accessories": ["charger", "case"] },
                { "customer_phone": "+966501234568", "name": "iPhone 13", "serial_number": "SN-2",
                  "warranty": false, "warranty_expiry": "2023-01-15", "accessories": [] }
            ])),
        ),
        (
            EntityKind::MaintenanceRequests,
            records(json!([
                { "customer_phone": "+966501234567", "device_serial": "SN-1", "issue": "Screen cracked,\nno touch",
                  "under_warranty": false, "service_only": true, "service_fee": 75.0, "service_fee_type": "paid" }
            ])),
        ),
    ]
}

#[test]
fn test_export_then_import_round_trips() {
    for (kind, original) in fixtures() {
        let schema = schema_for(kind);
        let csv = export_records(&original, schema).unwrap();
        let raw = parse(&csv);

        assert!(validate_entity(&raw, schema).is_valid, "{} export does not validate", kind);
        assert_eq!(map_entity(&raw, schema), original, "{} did not round-trip", kind);
    }
}

#[test]
fn test_invalid_results_name_rows() {
    let csv = "name,phone,address,type\n\
        ,+966501234567,Riyadh,consumer\n\
        Acme,0123,Jeddah,wholesale\n\
        Bob,+966501234569,,\n";
    let raw = parse(csv);
    let result = validate_entity(&raw, schema_for(EntityKind::Customers));

    assert!(!result.is_valid);
    assert!(!result.errors.is_empty());
    for err in &result.errors {
        let row: usize = err
            .strip_prefix("Row ")
            .and_then(|rest| rest.split(':').next())
            .and_then(|n| n.parse().ok())
            .unwrap_or_else(|| panic!("error without row: {}", err));
        assert!((1..=raw.len()).contains(&row), "{}", err);
    }
    assert_eq!(
        result.errors,
        vec![
            "Row 1: name is required",
            "Row 2: Invalid phone value",
            "Row 2: Invalid type value",
            "Row 3: address is required",
            "Row 3: type is required",
        ]
    );
}

#[test]
fn test_missing_columns_reported() {
    let raw = parse("name,phone\nJohn,+966501234567\n");
    let result = validate_entity(&raw, schema_for(EntityKind::Customers));
    assert_eq!(result.errors[0], "Missing required columns: address, type");
}

#[test]
fn test_every_mapped_column_is_required() {
    let raw = parse("name,phone,address
John,+966501234567,Riyadh
");
    let result = validate_entity(&raw, schema_for(EntityKind::Customers));
    assert_eq!(result.errors[0], "Missing required columns: type");

    let raw = parse("name,phone,address,type
John,+966501234567,Riyadh,
");
    let result = validate_entity(&raw, schema_for(EntityKind::Customers));
    assert_eq!(result.errors, vec!["Row 1: type is required"]);

    let raw = parse(
        "customer_phone,name,serial_number,warranty,warranty_expiry,accessories
         +966501234567,S21,SN-1,false,,
",
    );
    let result = validate_entity(&raw, schema_for(EntityKind::Devices));
    assert_eq!(
        result.errors,
        vec!["Row 1: warranty_expiry is required", "Row 1: accessories is required"]
    );
}

#[test]
fn test_mapping_is_idempotent() {
    let raw = parse(
        "customer_phone,name,serial_number,warranty,warranty_expiry,accessories\n\
         +966501234567,S21,SN-1,true,2024/12/31,not json\n",
    );
    let schema = schema_for(EntityKind::Devices);
    let first = map_entity(&raw, schema);

    assert_eq!(first, map_entity(&raw, schema));
    assert_eq!(first[0]["warranty_expiry"], "2024-12-31");
    assert_eq!(first[0]["accessories"], json!([]));
}

#[test]
fn test_empty_input() {
    let result = validate(&[], &["name"], &[]);
    assert!(!result.is_valid);
    assert_eq!(result.errors, vec!["No data found in CSV file"]);

    let preview = prepare_bytes(b"code,name,price,warranty\n", EntityKind::SpareParts, &ParseOptions::default())
        .unwrap();
    assert_eq!(preview.total_rows, 0);
    assert_eq!(preview.validation.errors, vec!["No data found in CSV file"]);
}

#[test]
fn test_customer_accepted_unchanged() {
    let raw = parse("Name,Phone,Address,Type\nJohn Doe,+966501234567,Riyadh,consumer\n");
    let schema = schema_for(EntityKind::Customers);

    assert!(validate_entity(&raw, schema).is_valid);
    assert_eq!(
        Value::Object(map_entity(&raw, schema).remove(0)),
        json!({ "name": "John Doe", "phone": "+966501234567", "address": "Riyadh", "type": "consumer" })
    );
}

#[test]
fn test_spare_part_values_coerced() {
    let raw = parse("code,name,price,warranty\nSP001,Screen,150.00,true\n");
    let mapped = map_entity(&raw, schema_for(EntityKind::SpareParts));

    assert_eq!(mapped[0]["price"], json!(150.0));
    assert_eq!(mapped[0]["warranty"], json!(true));
}

#[test]
fn test_bad_phone_rejected() {
    let raw = parse("name,phone,address,type\nX,not-a-phone,Riyadh,consumer\n");
    let result = validate_entity(&raw, schema_for(EntityKind::Customers));

    assert!(!result.is_valid);
    assert!(result.errors.iter().any(|e| e.contains("Row 1") && e.contains("phone")));
}

#[tokio::test]
async fn test_import_then_export_from_store() {
    let store = MemoryStore::new();
    let csv = "Part Code,Center Name,QTY Added,Qty Available,Qty Sold,Qty Reserved\r\n\
        SP001,Main,50,45,5,0\r\n\
        SP002,North,10,10,0,0\r\n";

    let report = import_bytes(&store, csv.as_bytes(), EntityKind::Inventory, &ParseOptions::default())
        .await
        .unwrap();
    assert_eq!(report.imported, 2);

    let stored = store.fetch_all(EntityKind::Inventory).await.unwrap();
    assert_eq!(stored[1]["qty_added"], json!(10));

    let exported = export_records(&stored, schema_for(EntityKind::Inventory)).unwrap();
    assert_eq!(
        exported,
        "part_code,center_name,qty_added,qty_available,qty_sold,qty_reserved\n\
         SP001,Main,50,45,5,0\n\
         SP002,North,10,10,0,0\n"
    );
}

#[tokio::test]
async fn test_rejected_import_leaves_store_empty() {
    let store = MemoryStore::new();
    let csv = "code,name,price,warranty\nSP001,Screen,150,true\nSP002,,-3,yes\n";

    let err = import_bytes(&store, csv.as_bytes(), EntityKind::SpareParts, &ParseOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Invalid(ref v) if v.errors.len() == 3));
    assert!(store.fetch_all(EntityKind::SpareParts).await.unwrap().is_empty());
}

#[test]
fn test_semicolon_files_with_detection() {
    let preview = prepare_bytes(
        "name;phone;address;type\nJohn;+966501234567;Riyadh;consumer\n".as_bytes(),
        EntityKind::Customers,
        &ParseOptions::detecting(),
    )
    .unwrap();

    assert!(preview.validation.is_valid);
    assert_eq!(preview.csv_info.unwrap().delimiter, ';');
}
