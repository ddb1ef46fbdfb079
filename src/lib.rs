//! sqlsentinel: schema-aware semantic validation for generated SQL
//!
//! This library checks SQL written by an automated agent against a known
//! schema. It flags phantom (hallucinated) tables, columns and functions,
//! and checks JOIN conditions against declared foreign keys.
//!
//! Parsing never fails: SQL that no dialect accepts is salvaged into a
//! best-effort tree, so every entry point returns a structured result.
//!
//! ```
//! use sqlsentinel::schema::{Column, Schema, Table};
//!
//! let schema = Schema::new(vec![Table::new(
//!     "customers",
//!     vec![Column::new("id", "INTEGER"), Column::new("name", "TEXT")],
//! )])
//! .unwrap();
//!
//! let report = sqlsentinel::detect("SELECT name, age FROM customers", &schema, "postgres");
//! assert_eq!(report.phantom_columns, vec!["age"]);
//! ```

pub mod analysis;
pub mod error;
pub mod parser;
pub mod schema;

pub use analysis::{
    detect, join_checks, valid_join_paths, validate, validate_batch, validate_identifiers,
    verify_joins, BatchEntry, HallucinationReport, JoinCheck, QueryInput, ValidationResult,
};
pub use error::SentinelError;
pub use parser::{
    dialect_functions, extract_identifiers, is_valid_function, parse, IdentifierSet, ParseOutcome,
    SqlDialect,
};
pub use schema::Schema;
