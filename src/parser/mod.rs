//! SQL parsing: dialects, the structural tree and identifier extraction

pub mod dialect;
pub mod ident_extract;
mod salvage;
mod sql_parser;
pub mod tree;

pub use dialect::{
    dialect_functions, is_valid_function, FunctionAlias, FunctionCatalog, SqlDialect,
};
pub use ident_extract::IdentifierSet;
pub use sql_parser::{extract_identifiers, parse, parse_dialect, validate_syntax};
pub use tree::{
    AliasBinding, AliasKind, ColumnRef, Equality, FunctionCall, JoinKind, JoinNode, Node,
    NodeKind, Operand, ParseOutcome, StructuralTree, TableRef,
};
