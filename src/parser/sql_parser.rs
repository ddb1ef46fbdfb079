//! Multi-dialect SQL parsing with graceful degradation.
//!
//! Parsing never fails: the requested dialect is tried first, then a fixed
//! fallback chain, then a per-statement salvage that keeps whatever parses
//! and regex-scans the rest.

use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::{Parser, ParserError};
use tracing::{debug, warn};

use super::dialect::SqlDialect;
use super::ident_extract::IdentifierSet;
use super::salvage::salvage_nodes;
use super::tree::{ParseOutcome, StructuralTree};

/// Fallback grammars in order; `None` is the generic grammar
const FALLBACK_DIALECTS: [Option<SqlDialect>; 4] = [
    Some(SqlDialect::Postgres),
    Some(SqlDialect::BigQuery),
    Some(SqlDialect::Snowflake),
    None,
];

fn parse_with(sql: &str, dialect: Option<SqlDialect>) -> Result<Vec<Statement>, ParserError> {
    let parser_dialect = SqlDialect::parser_dialect_for(dialect);
    Parser::parse_sql(parser_dialect.as_ref(), sql)
}

fn dialect_label(dialect: Option<SqlDialect>) -> &'static str {
    dialect.map(SqlDialect::name).unwrap_or("generic")
}

/// Parse SQL into a structural tree for the named dialect.
///
/// An empty or unrecognized dialect name parses with the generic grammar.
/// See [`ParseOutcome`] for how the caller can tell a clean parse from a
/// fallback or a salvage.
pub fn parse(sql: &str, dialect: &str) -> StructuralTree {
    parse_dialect(sql, SqlDialect::from_name(dialect))
}

/// Parse SQL with an already-normalized dialect
pub fn parse_dialect(sql: &str, dialect: Option<SqlDialect>) -> StructuralTree {
    match parse_with(sql, dialect) {
        Ok(statements) => {
            return StructuralTree::build(statements, Vec::new(), ParseOutcome::Clean { dialect });
        }
        Err(e) => {
            debug!(dialect = dialect_label(dialect), error = %e, "primary parse failed");
        }
    }

    for fallback in FALLBACK_DIALECTS {
        if fallback == dialect {
            continue;
        }
        match parse_with(sql, fallback) {
            Ok(statements) => {
                debug!(dialect = dialect_label(fallback), "fallback parse succeeded");
                return StructuralTree::build(
                    statements,
                    Vec::new(),
                    ParseOutcome::Fallback { dialect: fallback },
                );
            }
            Err(e) => {
                debug!(dialect = dialect_label(fallback), error = %e, "fallback parse failed");
            }
        }
    }

    warn!("no dialect accepted the SQL; salvaging a best-effort tree");
    salvage(sql)
}

/// Parse each `;`-separated piece on its own, scanning the pieces that fail
fn salvage(sql: &str) -> StructuralTree {
    let dialect = GenericDialect {};
    let mut statements = Vec::new();
    let mut salvaged = Vec::new();

    for piece in split_statements(sql) {
        match Parser::parse_sql(&dialect, piece) {
            Ok(parsed) => statements.extend(parsed),
            Err(_) => salvaged.extend(salvage_nodes(piece)),
        }
    }

    StructuralTree::build(statements, salvaged, ParseOutcome::Degraded)
}

/// Split on semicolons outside quotes
fn split_statements(sql: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;

    for (idx, ch) in sql.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, ';') => {
                pieces.push(&sql[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&sql[start..]);

    pieces
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}

/// Check whether the requested dialect (or a fallback) accepts the SQL.
///
/// Returns the primary dialect's error message when nothing parses.
pub fn validate_syntax(sql: &str, dialect: &str) -> Result<(), String> {
    let dialect = SqlDialect::from_name(dialect);
    let primary_error = match parse_with(sql, dialect) {
        Ok(_) => return Ok(()),
        Err(e) => e.to_string(),
    };

    let accepted = FALLBACK_DIALECTS
        .iter()
        .filter(|&&fallback| fallback != dialect)
        .any(|&fallback| parse_with(sql, fallback).is_ok());
    if accepted {
        Ok(())
    } else {
        Err(primary_error)
    }
}

/// Extract all referenced identifiers from SQL
pub fn extract_identifiers(sql: &str, dialect: &str) -> IdentifierSet {
    IdentifierSet::from_tree(&parse(sql, dialect))
}
