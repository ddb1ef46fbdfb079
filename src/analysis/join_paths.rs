//! Join condition checks against declared foreign keys.
//!
//! A join without a foreign-key path is tolerated: denormalized schemas
//! join on undeclared relationships all the time. The per-pair verdict is
//! available through [`join_checks`] but never turns into an error.

use std::collections::HashMap;

use tracing::debug;

use super::results::{JoinCheck, ValidationResult};
use crate::parser::{parse, ColumnRef, StructuralTree};
use crate::schema::Schema;

/// A column operand with its qualifier resolved through table aliases
struct ResolvedColumn<'a> {
    table: Option<String>,
    column: &'a str,
}

impl ResolvedColumn<'_> {
    fn display(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.column),
            None => self.column.to_string(),
        }
    }
}

fn resolve<'a>(column: &'a ColumnRef, aliases: &HashMap<String, String>) -> ResolvedColumn<'a> {
    let table = column.table.as_ref().map(|qualifier| {
        aliases
            .get(&qualifier.to_lowercase())
            .cloned()
            .unwrap_or_else(|| qualifier.clone())
    });
    ResolvedColumn {
        table,
        column: &column.name,
    }
}

/// Check every column-to-column equality in every join's ON clause
pub fn join_checks(sql: &str, schema: &Schema, dialect: &str) -> Vec<JoinCheck> {
    join_checks_tree(&parse(sql, dialect), schema)
}

pub fn join_checks_tree(tree: &StructuralTree, schema: &Schema) -> Vec<JoinCheck> {
    let aliases = tree.table_aliases();
    let mut checks = Vec::new();

    for join in tree.joins() {
        let Some(joined) = &join.table else {
            continue;
        };
        if !join.has_on {
            // CROSS JOIN, USING, or an implicit join
            continue;
        }
        for (left, right) in join.conditions.iter().filter_map(|eq| eq.column_pair()) {
            let left = resolve(left, &aliases);
            let right = resolve(right, &aliases);
            checks.push(JoinCheck {
                joined_table: joined.name().to_string(),
                left: left.display(),
                right: right.display(),
                has_foreign_key_path: is_valid_join_path(&left, &right, schema),
            });
        }
    }

    checks
}

/// Verify joins. Missing foreign-key paths are logged, not reported.
pub fn verify_joins(sql: &str, schema: &Schema, dialect: &str) -> ValidationResult {
    for check in join_checks(sql, schema, dialect) {
        if !check.has_foreign_key_path {
            debug!(
                joined_table = %check.joined_table,
                left = %check.left,
                right = %check.right,
                "join condition has no declared foreign key path"
            );
        }
    }
    ValidationResult::valid()
}

/// A foreign key from either side's column to the other side's table
fn is_valid_join_path(
    left: &ResolvedColumn<'_>,
    right: &ResolvedColumn<'_>,
    schema: &Schema,
) -> bool {
    let (Some(left_table), Some(right_table)) = (&left.table, &right.table) else {
        // Can't verify without table qualifiers
        return true;
    };

    let references = |table: &str, column: &str, target: &str| {
        schema
            .table(table)
            .and_then(|t| t.column(column))
            .is_some_and(|c| c.references_table(target))
    };

    references(left_table.as_str(), left.column, right_table.as_str())
        || references(right_table.as_str(), right.column, left_table.as_str())
}

/// Tables joinable with `table` through an outgoing or incoming foreign key
pub fn valid_join_paths(table: &str, schema: &Schema) -> Vec<String> {
    let Some(info) = schema.table(table) else {
        return Vec::new();
    };

    let mut targets: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !targets.iter().any(|t| t == name) {
            targets.push(name.to_string());
        }
    };

    for column in &info.columns {
        if let Some((target, _)) = column.foreign_key_target() {
            push(target);
        }
    }

    for other in schema.tables() {
        if other.name == info.name {
            continue;
        }
        if other.columns.iter().any(|c| c.references_table(&info.name)) {
            push(&other.name);
        }
    }

    targets
}
