//! Identifier extraction: name helpers over sqlparser types, and the
//! `IdentifierSet` produced from a structural tree.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use sqlparser::ast::{Expr, ObjectName};

use super::tree::StructuralTree;

/// Extract the last identifier value from an ObjectName.
///
/// `sales.public.orders` yields `orders`, without quotes.
pub fn from_object_name(name: &ObjectName) -> String {
    name.0.last().map(|i| i.value.clone()).unwrap_or_default()
}

/// All identifier values of an ObjectName, in catalog, schema, name order
pub fn object_name_parts(name: &ObjectName) -> Vec<String> {
    name.0.iter().map(|i| i.value.clone()).collect()
}

/// Extract a column name from an Expr.
///
/// Handles Identifier and CompoundIdentifier expressions.
/// Returns the unquoted column name, or None for complex expressions.
pub fn column_from_expr(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.clone()),
        _ => None,
    }
}

/// The last `.`-separated segment of a possibly-qualified name
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Tables, columns, functions and aliases referenced by a SQL text.
///
/// Lists are deduplicated and keep first-seen order. Consumers should
/// compare them as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentifierSet {
    /// Table names, `catalog.schema.table` when qualified
    pub tables: Vec<String>,
    /// Column names, `table.column` when qualified
    pub columns: Vec<String>,
    /// Upper-cased function names
    pub functions: Vec<String>,
    /// Alias → underlying table, column or expression
    pub aliases: BTreeMap<String, String>,
    /// CTE names and derived-table aliases
    pub derived_relations: Vec<String>,
}

impl IdentifierSet {
    pub fn from_tree(tree: &StructuralTree) -> Self {
        let mut aliases = BTreeMap::new();
        for binding in tree.aliases() {
            aliases.insert(binding.alias.clone(), binding.target.clone());
        }

        Self {
            tables: dedup(tree.tables().map(|t| t.qualified())),
            columns: dedup(tree.columns().map(|c| c.qualified())),
            functions: dedup(tree.functions().map(|f| f.name.to_uppercase())),
            aliases,
            derived_relations: tree.derived_relations().to_vec(),
        }
    }

    /// Total identifiers examined for scoring
    pub fn examined(&self) -> usize {
        self.tables.len() + self.columns.len() + self.functions.len()
    }

    /// Whether `name` is a derived relation (case-insensitive)
    pub fn is_derived(&self, name: &str) -> bool {
        self.derived_relations
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
    }

    /// Alias lookup, case-insensitive
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(alias))
            .map(|(_, v)| v.as_str())
    }
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
