//! Error types for sqlsentinel
//!
//! The validation engine itself never fails on malformed SQL. These errors
//! come from loading schemas and reading query files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading inputs for validation
#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Failed to read schema file: {path}")]
    SchemaReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema document: {path}")]
    SchemaParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse schema DDL: {message}")]
    DdlParseError { message: String },

    #[error("Duplicate table in schema: {name}")]
    DuplicateTable { name: String },

    #[error("Invalid foreign key on {table}.{column}: '{reference}' (expected 'table.column')")]
    InvalidForeignKey {
        table: String,
        column: String,
        reference: String,
    },

    #[error("Failed to read SQL file: {path}")]
    SqlFileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<sqlparser::parser::ParserError> for SentinelError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        SentinelError::DdlParseError {
            message: err.to_string(),
        }
    }
}
