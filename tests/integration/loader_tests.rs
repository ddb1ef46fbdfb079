//! Integration tests for loading schemas from files

use std::path::Path;

use sqlsentinel::{validate, Schema, SentinelError};

use crate::common::{temp_file, STOREFRONT_DDL, STOREFRONT_JSON};

#[test]
fn test_json_schema_file_drives_validation() {
    let file = temp_file(STOREFRONT_JSON, ".json");
    let schema = Schema::from_json_file(file.path()).unwrap();

    let result = validate(
        "SELECT c.name, loyalty_tier(c.id) FROM customers c JOIN orders o ON c.id = o.customer_id",
        &schema,
        "postgres",
    );
    assert!(result.is_valid, "{:?}", result.errors);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
}

#[test]
fn test_ddl_schema_file_with_bom() {
    let file = temp_file(&format!("\u{FEFF}{}", STOREFRONT_DDL), ".sql");
    let schema = Schema::from_ddl_file(file.path(), "postgres").unwrap();
    assert_eq!(schema.tables().len(), 4);

    let result = validate("SELECT quantity, discount FROM order_items", &schema, "postgres");
    assert_eq!(result.errors, vec!["Column 'discount' does not exist in any table"]);
}

#[test]
fn test_missing_schema_file() {
    let err = Schema::from_json_file(Path::new("/nonexistent/schema.json")).unwrap_err();
    assert!(matches!(err, SentinelError::SchemaReadError { .. }));
}

#[test]
fn test_malformed_json_schema_file_reports_path() {
    let file = temp_file("{ not json", ".json");
    let err = Schema::from_json_file(file.path()).unwrap_err();
    match err {
        SentinelError::SchemaParseError { path, .. } => assert_eq!(path, file.path()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unparseable_ddl_file() {
    let file = temp_file("CREATE TABLE (", ".sql");
    let err = Schema::from_ddl_file(file.path(), "postgres").unwrap_err();
    assert!(matches!(err, SentinelError::DdlParseError { .. }));
}
