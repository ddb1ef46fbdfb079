//! Unit tests for phantom identifier detection and validation

use pretty_assertions::assert_eq;
use sqlsentinel::analysis::DEGRADED_PARSE_WARNING;
use sqlsentinel::schema::{Column, Schema, Table};
use sqlsentinel::{detect, extract_identifiers, validate, validate_identifiers};

use crate::common::storefront_schema;

fn customers_only() -> Schema {
    Schema::new(vec![Table::new(
        "customers",
        vec![
            Column::new("id", "INTEGER"),
            Column::new("name", "TEXT"),
            Column::new("email", "TEXT"),
        ],
    )])
    .unwrap()
}

// ============================================================================
// Detection Tests
// ============================================================================

#[test]
fn test_clean_query_has_no_phantoms() {
    let report = detect(
        "SELECT c.name, COUNT(o.id) AS orders_placed \
         FROM customers c LEFT JOIN orders o ON c.id = o.customer_id \
         WHERE o.total > 50 \
         GROUP BY c.name ORDER BY orders_placed DESC",
        &storefront_schema(),
        "postgres",
    );
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.hallucination_score, 0.0);
}

#[test]
fn test_phantom_column_score() {
    let report = detect("SELECT name, age FROM customers", &customers_only(), "postgres");
    assert_eq!(report.phantom_columns, vec!["age"]);
    assert!(report.phantom_tables.is_empty());
    assert_eq!(report.total_hallucinations, 1);
    // one table and two columns examined
    assert!((report.hallucination_score - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_one_phantom_table_among_several() {
    let report = detect(
        "SELECT o.id FROM orders o JOIN invoices i ON i.order_id = o.id \
         JOIN customers c ON c.id = o.customer_id",
        &storefront_schema(),
        "postgres",
    );
    assert_eq!(report.phantom_tables, vec!["invoices"]);
}

#[test]
fn test_table_and_bare_column_spellings_both_accepted() {
    let schema = storefront_schema();
    assert!(detect("SELECT orders.total FROM orders", &schema, "").is_clean());
    assert!(detect("SELECT total FROM orders", &schema, "").is_clean());
}

#[test]
fn test_detection_is_case_insensitive() {
    let schema = storefront_schema();
    let upper = detect("SELECT Total FROM Orders", &schema, "postgres");
    let lower = detect("select total from orders", &schema, "postgres");
    assert_eq!(upper.phantom_tables, lower.phantom_tables);
    assert_eq!(upper.phantom_columns, lower.phantom_columns);
    assert_eq!(upper.phantom_functions, lower.phantom_functions);
    assert!(upper.is_clean());
}

#[test]
fn test_alias_qualified_phantom_column() {
    let report = detect(
        "SELECT c.nickname FROM customers c",
        &storefront_schema(),
        "postgres",
    );
    assert_eq!(report.phantom_columns, vec!["c.nickname"]);
}

#[test]
fn test_snowflake_if_accepted_through_iff() {
    let sql = "SELECT IF(total > 100, 'big', 'small') AS bucket FROM orders";
    let schema = storefront_schema();

    let snowflake = detect(sql, &schema, "snowflake");
    assert!(snowflake.phantom_functions.is_empty(), "{:?}", snowflake);

    let postgres = detect(sql, &schema, "postgres");
    assert_eq!(postgres.phantom_functions, vec!["IF"]);
}

#[test]
fn test_case_expression_is_always_valid() {
    let report = detect(
        "SELECT CASE WHEN total > 100 THEN 'big' ELSE 'small' END FROM orders",
        &storefront_schema(),
        "sqlite",
    );
    assert!(report.phantom_functions.is_empty());
}

#[test]
fn test_custom_schema_function_is_accepted() {
    let schema = storefront_schema().with_functions(["loyalty_tier"]);
    let sql = "SELECT loyalty_tier(id) FROM customers";
    assert!(detect(sql, &schema, "postgres").is_clean());
    assert_eq!(
        detect(sql, &storefront_schema(), "postgres").phantom_functions,
        vec!["LOYALTY_TIER"]
    );
}

#[test]
fn test_score_stays_within_bounds() {
    let schema = storefront_schema();
    for sql in [
        "SELECT * FROM ghost",
        "SELECT a, b, c FROM nowhere",
        "SELECT made_up(x) FROM y",
        "SELECT 1",
        "",
    ] {
        let report = detect(sql, &schema, "postgres");
        assert!(
            (0.0..=1.0).contains(&report.hallucination_score),
            "{}: {}",
            sql,
            report.hallucination_score
        );
    }
    assert_eq!(detect("SELECT 1", &schema, "").hallucination_score, 0.0);
}

#[test]
fn test_snowflake_date_units_are_not_columns() {
    let report = detect(
        "SELECT DATEDIFF(day, created_at, created_at), DATEADD(month, 1, created_at) FROM orders",
        &storefront_schema(),
        "snowflake",
    );
    assert!(report.phantom_columns.is_empty(), "{:?}", report);
    assert!(report.is_clean());
}

#[test]
fn test_bigquery_date_units_are_not_columns() {
    let report = detect(
        "SELECT DATE_TRUNC(created_at, MONTH), TIMESTAMP_DIFF(created_at, created_at, DAY) \
         FROM orders",
        &storefront_schema(),
        "bigquery",
    );
    assert!(report.phantom_columns.is_empty(), "{:?}", report);
    assert!(report.is_clean());
}

#[test]
fn test_unit_word_outside_date_function_is_still_checked() {
    let report = detect("SELECT SUM(day) FROM orders", &storefront_schema(), "postgres");
    assert_eq!(report.phantom_columns, vec!["day"]);
}

#[test]
fn test_unnest_alias_is_not_a_phantom_column() {
    let report = detect("SELECT x FROM UNNEST([1, 2]) AS x", &storefront_schema(), "bigquery");
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.hallucination_score, 0.0);
}

#[test]
fn test_table_function_column_list_is_accepted() {
    let report = detect(
        "SELECT g.n, n FROM generate_series(1, 3) AS g(n)",
        &storefront_schema(),
        "postgres",
    );
    assert!(report.is_clean(), "{:?}", report);
}

#[test]
fn test_update_set_target_is_checked() {
    let report = detect(
        "UPDATE orders SET bogus = 1 WHERE id = 2",
        &storefront_schema(),
        "postgres",
    );
    assert_eq!(report.phantom_columns, vec!["bogus"]);

    let report = detect(
        "UPDATE orders SET total = 0 WHERE id = 2",
        &storefront_schema(),
        "postgres",
    );
    assert!(report.is_clean(), "{:?}", report);
}

#[test]
fn test_insert_column_list_is_checked() {
    let report = detect(
        "INSERT INTO orders (id, totl) VALUES (1, 2)",
        &storefront_schema(),
        "postgres",
    );
    assert_eq!(report.phantom_columns, vec!["totl"]);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_validate_ghost_table() {
    let result = validate("SELECT * FROM ghost_table", &storefront_schema(), "postgres");
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("ghost_table"));
    assert_eq!(result.errors[0], "Table 'ghost_table' does not exist in schema");

    let report = result.hallucination_report.unwrap();
    assert_eq!(report.phantom_tables, vec!["ghost_table"]);
}

#[test]
fn test_validate_phantom_column_message() {
    let result = validate("SELECT name, age FROM customers", &customers_only(), "postgres");
    assert_eq!(result.errors, vec!["Column 'age' does not exist in any table"]);
}

#[test]
fn test_validate_phantom_function_is_a_warning() {
    let result = validate("SELECT frobnicate(total) FROM orders", &storefront_schema(), "duckdb");
    assert!(result.is_valid);
    assert_eq!(
        result.warnings,
        vec!["Function 'FROBNICATE' may not be valid for dialect 'duckdb'"]
    );
}

#[test]
fn test_validate_degraded_parse_warns() {
    let result = validate("SELEC name FROM ghost WHERE", &storefront_schema(), "postgres");
    assert!(result.warnings.iter().any(|w| w == DEGRADED_PARSE_WARNING));
    // salvaged table references are still checked
    assert_eq!(result.errors, vec!["Table 'ghost' does not exist in schema"]);
}

// ============================================================================
// Schema Validator Tests
// ============================================================================

#[test]
fn test_validate_identifiers_messages() {
    let ids = extract_identifiers(
        "SELECT c.phone FROM customers c JOIN invoices v ON v.id = c.id",
        "",
    );
    let result = validate_identifiers(&ids, &storefront_schema());
    assert!(!result.is_valid);
    assert!(result.errors.contains(&"Table 'invoices' does not exist.".to_string()));
    assert!(result
        .errors
        .contains(&"Column 'c.phone' does not exist in any table.".to_string()));
    assert!(result.warnings.is_empty());
}
