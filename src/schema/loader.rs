//! Schema loading from JSON documents and CREATE TABLE DDL

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use sqlparser::ast::{ColumnOption, ObjectName, Statement, TableConstraint};
use sqlparser::parser::Parser;
use tracing::debug;

use super::model::{Column, Schema, Table};
use crate::error::SentinelError;
use crate::parser::ident_extract::from_object_name;
use crate::parser::SqlDialect;

/// On-disk schema document
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    tables: Vec<Table>,
    #[serde(default)]
    functions: Vec<String>,
}

impl Schema {
    /// Parse a schema from its JSON document form
    pub fn from_json_str(json: &str) -> Result<Self, SentinelError> {
        Self::from_document(json, Path::new("<inline>"))
    }

    /// Load a schema from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, SentinelError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SentinelError::SchemaReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_document(&content, path)
    }

    fn from_document(json: &str, path: &Path) -> Result<Self, SentinelError> {
        let document: SchemaDocument =
            serde_json::from_str(json).map_err(|e| SentinelError::SchemaParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Schema::new(document.tables)?.with_functions(document.functions))
    }

    /// Load a schema from a file of CREATE TABLE statements
    pub fn from_ddl_file(path: &Path, dialect: &str) -> Result<Self, SentinelError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SentinelError::SchemaReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
        // Strip UTF-8 BOM if present
        let content = content.strip_prefix('\u{FEFF}').unwrap_or(&content);
        Self::from_ddl(content, dialect)
    }

    /// Build a schema from CREATE TABLE statements.
    ///
    /// Inline `REFERENCES` options and table-level `FOREIGN KEY` constraints
    /// become "table.column" foreign keys. A reference without a column list
    /// points at the target's primary key, or its first column when the
    /// target declares none. Statements other than CREATE TABLE are ignored.
    pub fn from_ddl(sql: &str, dialect: &str) -> Result<Self, SentinelError> {
        let parser_dialect = SqlDialect::parser_dialect_for(SqlDialect::from_name(dialect));
        let statements = Parser::parse_sql(parser_dialect.as_ref(), sql)?;

        let mut tables = Vec::new();
        let mut primary_keys: HashMap<String, String> = HashMap::new();
        // (table index, column index, referenced table) needing column resolution
        let mut unresolved = Vec::new();

        for statement in &statements {
            let Statement::CreateTable(create_table) = statement else {
                debug!("ignoring non-CREATE TABLE statement in schema DDL");
                continue;
            };

            let table_name = from_object_name(&create_table.name);
            let table_idx = tables.len();
            let mut columns = Vec::with_capacity(create_table.columns.len());

            for (col_idx, def) in create_table.columns.iter().enumerate() {
                let mut column = Column::new(def.name.value.clone(), def.data_type.to_string());
                for option in &def.options {
                    match &option.option {
                        ColumnOption::Unique {
                            is_primary: true, ..
                        } => {
                            primary_keys.insert(table_name.to_lowercase(), def.name.value.clone());
                        }
                        ColumnOption::ForeignKey {
                            foreign_table,
                            referred_columns,
                            ..
                        } => match referred_columns.first() {
                            Some(target) => {
                                column.foreign_key =
                                    Some(reference(foreign_table, &target.value));
                            }
                            None => {
                                unresolved.push((table_idx, col_idx, foreign_table.clone()))
                            }
                        },
                        _ => {}
                    }
                }
                columns.push(column);
            }

            for constraint in &create_table.constraints {
                match constraint {
                    TableConstraint::PrimaryKey { columns: pk, .. } => {
                        if let Some(first) = pk.first() {
                            primary_keys.insert(table_name.to_lowercase(), first.value.clone());
                        }
                    }
                    TableConstraint::ForeignKey {
                        columns: fk_columns,
                        foreign_table,
                        referred_columns,
                        ..
                    } => {
                        for (pos, fk_column) in fk_columns.iter().enumerate() {
                            let Some(col_idx) = columns.iter().position(|c: &Column| {
                                c.name.eq_ignore_ascii_case(&fk_column.value)
                            }) else {
                                continue;
                            };
                            match referred_columns.get(pos) {
                                Some(target) => {
                                    columns[col_idx].foreign_key =
                                        Some(reference(foreign_table, &target.value));
                                }
                                None => {
                                    unresolved.push((table_idx, col_idx, foreign_table.clone()))
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }

            tables.push(Table::new(table_name, columns));
        }

        for (table_idx, col_idx, foreign_table) in unresolved {
            let target = from_object_name(&foreign_table);
            let target_column = primary_keys.get(&target.to_lowercase()).cloned().or_else(|| {
                tables
                    .iter()
                    .find(|t: &&Table| t.name.eq_ignore_ascii_case(&target))
                    .and_then(|t| t.columns.first())
                    .map(|c| c.name.clone())
            });
            if let Some(target_column) = target_column {
                tables[table_idx].columns[col_idx].foreign_key =
                    Some(format!("{}.{}", target, target_column));
            }
        }

        Schema::new(tables)
    }
}

fn reference(foreign_table: &ObjectName, column: &str) -> String {
    format!("{}.{}", from_object_name(foreign_table), column)
}
