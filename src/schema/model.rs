//! Schema model representation

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::SentinelError;

/// A column of a schema table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared type as written by the schema source (e.g., "INTEGER")
    #[serde(rename = "type", default)]
    pub data_type: String,
    /// Foreign key reference encoded as "table.column"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            foreign_key: None,
        }
    }

    /// Attach a foreign key reference ("table.column")
    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.foreign_key = Some(target.into());
        self
    }

    /// Split the foreign key into (table, column).
    ///
    /// A schema-qualified reference ("sales.customers.id") yields the last
    /// table segment, so callers can compare against bare table names.
    pub fn foreign_key_target(&self) -> Option<(&str, &str)> {
        let reference = self.foreign_key.as_deref()?;
        let (table, column) = reference.rsplit_once('.')?;
        let table = table.rsplit('.').next().unwrap_or(table);
        Some((table, column))
    }

    /// Whether this column's foreign key points at `table` (case-insensitive)
    pub fn references_table(&self, table: &str) -> bool {
        self.foreign_key_target()
            .is_some_and(|(target, _)| target.eq_ignore_ascii_case(table))
    }
}

/// A table with its ordered columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Case-insensitive column lookup
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// The complete schema a query is validated against.
///
/// Tables keep their declaration order; lookups go through an exact-name
/// index first and a lower-cased index second.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: Vec<Table>,
    by_name: HashMap<String, usize>,
    by_lower_name: HashMap<String, usize>,
    functions: BTreeSet<String>,
}

impl Schema {
    /// Build a schema, rejecting duplicate table names and malformed foreign keys
    pub fn new(tables: Vec<Table>) -> Result<Self, SentinelError> {
        let mut schema = Self::default();
        for table in tables {
            schema.add_table(table)?;
        }
        Ok(schema)
    }

    pub fn add_table(&mut self, table: Table) -> Result<(), SentinelError> {
        if self.by_name.contains_key(&table.name) {
            return Err(SentinelError::DuplicateTable { name: table.name });
        }
        for column in &table.columns {
            if let Some(reference) = &column.foreign_key {
                if column.foreign_key_target().is_none() {
                    return Err(SentinelError::InvalidForeignKey {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        reference: reference.clone(),
                    });
                }
            }
        }

        let idx = self.tables.len();
        self.by_name.insert(table.name.clone(), idx);
        self.by_lower_name
            .entry(table.name.to_lowercase())
            .or_insert(idx);
        self.tables.push(table);
        Ok(())
    }

    /// Register custom (user-defined) function names, stored upper-cased
    pub fn with_functions<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.functions
            .extend(functions.into_iter().map(|f| f.as_ref().to_uppercase()));
        self
    }

    /// Look up a table by exact name, then by case-normalized name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.by_name
            .get(name)
            .or_else(|| self.by_lower_name.get(&name.to_lowercase()))
            .map(|&idx| &self.tables[idx])
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Whether any table in the schema has a column with this name
    pub fn any_table_has_column(&self, column: &str) -> bool {
        self.tables.iter().any(|t| t.has_column(column))
    }

    pub fn functions(&self) -> &BTreeSet<String> {
        &self.functions
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(&name.to_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
