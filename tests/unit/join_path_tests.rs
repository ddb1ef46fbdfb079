//! Unit tests for join condition verification

use pretty_assertions::assert_eq;
use sqlsentinel::{join_checks, valid_join_paths, verify_joins, JoinCheck};

use crate::common::storefront_schema;

#[test]
fn test_aliased_join_on_foreign_key() {
    let checks = join_checks(
        "SELECT c.name, o.total FROM customers c JOIN orders o ON c.id = o.customer_id",
        &storefront_schema(),
        "postgres",
    );
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].joined_table, "orders");
    assert!(checks[0].has_foreign_key_path);
}

#[test]
fn test_reversed_operands_still_match() {
    let checks = join_checks(
        "SELECT * FROM orders o JOIN customers c ON o.customer_id = c.id",
        &storefront_schema(),
        "",
    );
    assert_eq!(
        checks,
        vec![JoinCheck {
            joined_table: "customers".into(),
            left: "orders.customer_id".into(),
            right: "customers.id".into(),
            has_foreign_key_path: true,
        }]
    );
}

#[test]
fn test_multi_join_chain() {
    let checks = join_checks(
        "SELECT p.title, SUM(i.quantity) FROM orders o \
         JOIN order_items i ON i.order_id = o.id \
         LEFT JOIN products p ON p.id = i.product_id \
         JOIN customers c ON c.id = o.id \
         GROUP BY p.title",
        &storefront_schema(),
        "duckdb",
    );
    let verdicts: Vec<(&str, bool)> = checks
        .iter()
        .map(|c| (c.joined_table.as_str(), c.has_foreign_key_path))
        .collect();
    assert_eq!(
        verdicts,
        vec![("order_items", true), ("products", true), ("customers", false)]
    );
}

#[test]
fn test_non_column_equalities_are_skipped() {
    let checks = join_checks(
        "SELECT * FROM customers c JOIN orders o ON c.id = o.customer_id AND o.total = 0",
        &storefront_schema(),
        "postgres",
    );
    assert_eq!(checks.len(), 1);
}

#[test]
fn test_verify_joins_is_permissive() {
    let result = verify_joins(
        "SELECT * FROM customers c JOIN products p ON c.id = p.id",
        &storefront_schema(),
        "postgres",
    );
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
    assert!(result.hallucination_report.is_none());
}

#[test]
fn test_valid_join_paths() {
    let schema = storefront_schema();
    assert_eq!(valid_join_paths("order_items", &schema), vec!["orders", "products"]);
    assert_eq!(valid_join_paths("orders", &schema), vec!["customers", "order_items"]);
    assert_eq!(valid_join_paths("Products", &schema), vec!["order_items"]);
    assert!(valid_join_paths("ghost", &schema).is_empty());
}
