//! Unit tests for parsing and identifier extraction

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use sqlsentinel::parser::{
    dialect_functions, is_valid_function, parse, validate_syntax, NodeKind, ParseOutcome,
    SqlDialect,
};
use sqlsentinel::extract_identifiers;

fn set(items: &[String]) -> BTreeSet<String> {
    items.iter().cloned().collect()
}

fn strings(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Identifier Extraction Tests
// ============================================================================

#[test]
fn test_extract_tables_columns_and_aliases_from_join() {
    let ids = extract_identifiers(
        "SELECT c.name, o.total FROM customers c JOIN orders o ON c.id = o.customer_id",
        "postgres",
    );

    assert_eq!(set(&ids.tables), strings(&["customers", "orders"]));
    assert_eq!(
        set(&ids.columns),
        strings(&["c.name", "o.total", "c.id", "o.customer_id"])
    );
    assert_eq!(ids.resolve_alias("c"), Some("customers"));
    assert_eq!(ids.resolve_alias("O"), Some("orders"));
    assert!(ids.functions.is_empty());
}

#[test]
fn test_extract_qualified_table_keeps_all_parts() {
    let ids = extract_identifiers("SELECT id FROM analytics.public.orders", "postgres");
    assert_eq!(ids.tables, vec!["analytics.public.orders"]);
}

#[test]
fn test_extract_wildcard_is_not_a_column() {
    let ids = extract_identifiers("SELECT * FROM orders", "");
    assert_eq!(ids.tables, vec!["orders"]);
    assert!(ids.columns.is_empty());
}

#[test]
fn test_extract_functions_are_upper_cased() {
    let ids = extract_identifiers(
        "SELECT count(*), Lower(name), CAST(total AS INTEGER) FROM orders",
        "postgres",
    );
    assert_eq!(set(&ids.functions), strings(&["COUNT", "LOWER", "CAST"]));
}

#[test]
fn test_extract_cte_is_derived_not_table() {
    let ids = extract_identifiers(
        "WITH recent AS (SELECT customer_id FROM orders) SELECT customer_id FROM recent",
        "postgres",
    );
    assert_eq!(ids.tables, vec!["orders"]);
    assert!(ids.is_derived("recent"));
    assert!(ids.is_derived("RECENT"));
}

#[test]
fn test_extract_projection_alias_maps_to_column() {
    let ids = extract_identifiers("SELECT total AS amount FROM orders ORDER BY amount", "");
    assert_eq!(ids.resolve_alias("amount"), Some("total"));
}

#[test]
fn test_extract_is_idempotent() {
    let sql = "SELECT o.id, SUM(i.quantity) AS units \
               FROM orders o JOIN order_items i ON o.id = i.order_id \
               GROUP BY o.id HAVING SUM(i.quantity) > 2";
    let first = extract_identifiers(sql, "duckdb");
    let second = extract_identifiers(sql, "duckdb");
    assert_eq!(set(&first.tables), set(&second.tables));
    assert_eq!(set(&first.columns), set(&second.columns));
    assert_eq!(set(&first.functions), set(&second.functions));
    assert_eq!(first.aliases, second.aliases);
}

#[test]
fn test_extract_from_multiple_statements() {
    let ids = extract_identifiers("SELECT id FROM customers; SELECT id FROM orders;", "sqlite");
    assert_eq!(set(&ids.tables), strings(&["customers", "orders"]));
    assert_eq!(ids.columns, vec!["id"]);
}

// ============================================================================
// Parse Outcome Tests
// ============================================================================

#[test]
fn test_parse_clean_with_auto_detect() {
    let tree = parse("SELECT 1", "no-such-dialect");
    assert_eq!(tree.outcome(), ParseOutcome::Clean { dialect: None });
    assert!(!tree.outcome().is_degraded());
}

#[test]
fn test_parse_garbage_is_degraded_but_salvaged() {
    let tree = parse("SELEC name FROM customers c WHERE", "postgres");
    assert!(tree.outcome().is_degraded());
    assert_eq!(tree.outcome().dialect(), None);
    assert!(tree.statements().is_empty());

    let tables: Vec<&str> = tree.tables().map(|t| t.name()).collect();
    assert_eq!(tables, vec!["customers"]);
    assert_eq!(tree.find_all(NodeKind::Table).count(), 1);
}

#[test]
fn test_parse_keeps_statements_that_parse_during_salvage() {
    let tree = parse("SELECT id FROM orders; SELEC oops FROM ghost", "postgres");
    assert!(tree.outcome().is_degraded());
    assert_eq!(tree.statements().len(), 1);

    let tables: BTreeSet<String> = tree.tables().map(|t| t.name().to_string()).collect();
    assert_eq!(tables, strings(&["orders", "ghost"]));
}

#[test]
fn test_parse_empty_input() {
    let tree = parse("", "postgres");
    assert!(tree.is_empty());
    assert_eq!(tree.tables().count(), 0);
}

#[test]
fn test_validate_syntax() {
    assert!(validate_syntax("SELECT id FROM orders WHERE total > 10", "postgres").is_ok());

    let err = validate_syntax("SELEC name FROM customers", "postgres").unwrap_err();
    assert!(!err.is_empty());
}

// ============================================================================
// Dialect Table Tests
// ============================================================================

#[test]
fn test_dialect_aliases() {
    assert_eq!(SqlDialect::from_name("pg"), Some(SqlDialect::Postgres));
    assert_eq!(SqlDialect::from_name("sqlite3"), Some(SqlDialect::Sqlite));
    assert_eq!(SqlDialect::from_name("BQ"), Some(SqlDialect::BigQuery));
    assert_eq!(SqlDialect::from_name("mariadb"), Some(SqlDialect::MySql));
    assert_eq!(SqlDialect::from_name("clickhouse"), Some(SqlDialect::ClickHouse));
}

#[test]
fn test_dialect_functions_merge_common_set() {
    let snowflake = dialect_functions(Some(SqlDialect::Snowflake));
    assert!(snowflake.contains("IFF"));
    assert!(snowflake.contains("COUNT"));

    let auto = dialect_functions(None);
    assert!(auto.contains("COUNT"));
    assert!(!auto.contains("IFF"));
}

#[test]
fn test_is_valid_function_is_case_insensitive() {
    assert!(is_valid_function("date_trunc", "postgres"));
    assert!(is_valid_function("Count", "whatever"));
    assert!(!is_valid_function("iff", "postgres"));
    assert!(!is_valid_function("made_up_fn", "snowflake"));
}
