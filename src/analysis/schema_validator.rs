//! Existence checks of extracted identifiers against a schema

use super::results::ValidationResult;
use crate::parser::ident_extract::last_segment;
use crate::parser::IdentifierSet;
use crate::schema::Schema;

/// Validate extracted identifiers: missing tables and columns become errors
pub fn validate_identifiers(identifiers: &IdentifierSet, schema: &Schema) -> ValidationResult {
    let mut errors = Vec::new();

    for table in &identifiers.tables {
        if !schema.has_table(last_segment(table)) && !schema.has_table(table) {
            errors.push(format!("Table '{}' does not exist.", table));
        }
    }

    for column in &identifiers.columns {
        if !column_exists(column, identifiers, schema) {
            errors.push(format!("Column '{}' does not exist in any table.", column));
        }
    }

    ValidationResult::new(errors, Vec::new(), None)
}

/// A qualified column must exist on the table its qualifier resolves to.
/// An unqualified one may come from any referenced table, any schema table,
/// or be a projection alias.
fn column_exists(column: &str, identifiers: &IdentifierSet, schema: &Schema) -> bool {
    let (qualifier, name) = match column.rsplit_once('.') {
        Some((q, n)) => (Some(q), n),
        None => (None, column),
    };

    if let Some(qualifier) = qualifier.filter(|q| !identifiers.is_derived(q)) {
        let actual = identifiers.resolve_alias(qualifier).unwrap_or(qualifier);
        return schema
            .table(last_segment(actual))
            .is_some_and(|t| t.has_column(name));
    }

    let in_referenced = identifiers.tables.iter().any(|table| {
        schema
            .table(last_segment(table))
            .or_else(|| schema.table(table))
            .is_some_and(|t| t.has_column(name))
    });

    in_referenced
        || schema.any_table_has_column(name)
        || identifiers.resolve_alias(name).is_some()
}
