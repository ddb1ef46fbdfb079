//! Phantom (hallucinated) table, column and function detection

use std::collections::HashSet;

use tracing::debug;

use super::results::{HallucinationReport, ValidationResult};
use crate::parser::ident_extract::last_segment;
use crate::parser::{parse, FunctionCatalog, IdentifierSet, SqlDialect, StructuralTree};
use crate::schema::Schema;

/// Warning attached when the SQL could only be salvaged
pub const DEGRADED_PARSE_WARNING: &str = "SQL could not be fully parsed; results are best-effort";

/// Detect phantom identifiers in SQL
pub fn detect(sql: &str, schema: &Schema, dialect: &str) -> HallucinationReport {
    let tree = parse(sql, dialect);
    detect_tree(&tree, schema, SqlDialect::from_name(dialect))
}

/// Detect phantom identifiers in an already-parsed tree
pub fn detect_tree(
    tree: &StructuralTree,
    schema: &Schema,
    dialect: Option<SqlDialect>,
) -> HallucinationReport {
    let identifiers = IdentifierSet::from_tree(tree);
    detect_identifiers(&identifiers, schema, dialect)
}

pub fn detect_identifiers(
    identifiers: &IdentifierSet,
    schema: &Schema,
    dialect: Option<SqlDialect>,
) -> HallucinationReport {
    let catalog = FunctionCatalog::new(dialect, schema.functions());

    let phantom_tables = phantom_tables(identifiers, schema);
    let phantom_columns = phantom_columns(identifiers, schema);
    let phantom_functions = phantom_functions(identifiers, &catalog);

    let report = HallucinationReport::new(
        phantom_tables,
        phantom_columns,
        phantom_functions,
        identifiers.examined(),
    );
    if !report.is_clean() {
        debug!(
            tables = report.phantom_tables.len(),
            columns = report.phantom_columns.len(),
            functions = report.phantom_functions.len(),
            score = report.hallucination_score,
            "phantom identifiers detected"
        );
    }
    report
}

/// Validate SQL: phantom tables and columns are errors, phantom functions warnings
pub fn validate(sql: &str, schema: &Schema, dialect: &str) -> ValidationResult {
    let tree = parse(sql, dialect);
    let report = detect_tree(&tree, schema, SqlDialect::from_name(dialect));

    let mut errors = Vec::with_capacity(report.phantom_tables.len() + report.phantom_columns.len());
    for table in &report.phantom_tables {
        errors.push(format!("Table '{}' does not exist in schema", table));
    }
    for column in &report.phantom_columns {
        errors.push(format!("Column '{}' does not exist in any table", column));
    }

    let mut warnings: Vec<String> = report
        .phantom_functions
        .iter()
        .map(|f| format!("Function '{}' may not be valid for dialect '{}'", f, dialect))
        .collect();
    if tree.outcome().is_degraded() {
        warnings.push(DEGRADED_PARSE_WARNING.to_string());
    }

    ValidationResult::new(errors, warnings, Some(report))
}

/// A table is phantom when neither its bare nor its qualified spelling exists
fn phantom_tables(identifiers: &IdentifierSet, schema: &Schema) -> Vec<String> {
    identifiers
        .tables
        .iter()
        .filter(|table| !schema.has_table(last_segment(table)) && !schema.has_table(table))
        .cloned()
        .collect()
}

/// Lower-cased `column`, `table.column` and `alias.column` spellings the
/// referenced tables make available
fn valid_column_spellings(identifiers: &IdentifierSet, schema: &Schema) -> HashSet<String> {
    let mut valid = HashSet::new();

    for table in &identifiers.tables {
        let bare = last_segment(table);
        let Some(info) = schema.table(bare).or_else(|| schema.table(table)) else {
            continue;
        };
        let prefix = bare.to_lowercase();
        for column in &info.columns {
            let name = column.name.to_lowercase();
            valid.insert(format!("{}.{}", prefix, name));
            valid.insert(name);
        }
    }

    for (alias, actual) in &identifiers.aliases {
        let Some(info) = schema.table(actual) else {
            continue;
        };
        let prefix = alias.to_lowercase();
        for column in &info.columns {
            valid.insert(format!("{}.{}", prefix, column.name.to_lowercase()));
        }
    }

    valid
}

fn phantom_columns(identifiers: &IdentifierSet, schema: &Schema) -> Vec<String> {
    let valid = valid_column_spellings(identifiers, schema);

    identifiers
        .columns
        .iter()
        .filter(|column| {
            let lower = column.to_lowercase();
            let (qualifier, name) = match lower.rsplit_once('.') {
                Some((q, n)) => (Some(q), n),
                None => (None, lower.as_str()),
            };
            if valid.contains(&lower) || valid.contains(name) {
                return false;
            }
            match qualifier {
                // Columns of a CTE or subquery are judged by name alone
                Some(q) if identifiers.is_derived(q) => {
                    !exists_unqualified(name, identifiers, schema)
                }
                Some(_) => true,
                None => !exists_unqualified(name, identifiers, schema),
            }
        })
        .cloned()
        .collect()
}

/// An unqualified column is accepted if any schema table has it, or if it
/// names an alias (`ORDER BY total_spent`)
fn exists_unqualified(name: &str, identifiers: &IdentifierSet, schema: &Schema) -> bool {
    schema.any_table_has_column(name) || identifiers.resolve_alias(name).is_some()
}

fn phantom_functions(identifiers: &IdentifierSet, catalog: &FunctionCatalog<'_>) -> Vec<String> {
    identifiers
        .functions
        .iter()
        .filter(|function| !catalog.accepts(&function.to_uppercase()))
        .cloned()
        .collect()
}
