//! Best-effort node salvage for SQL no grammar accepts.
//!
//! Regex scanning recovers table references (with aliases) and function
//! calls. Columns are not recovered: without a parse, bare words cannot be
//! told apart from keywords reliably.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::tree::{AliasBinding, AliasKind, FunctionCall, Node, TableRef};

const IDENT: &str = r#"[A-Za-z_][\w$]*|"[^"]+"|`[^`]+`|\[[^\]]+\]"#;

static TABLE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:FROM|JOIN|INTO|UPDATE)\s+((?:{id})(?:\s*\.\s*(?:{id}))*)(?:\s+(?:AS\s+)?([A-Za-z_]\w*))?",
        id = IDENT
    ))
    .unwrap()
});

static FUNCTION_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)?)\s*\(").unwrap()
});

/// Keywords that are followed by parentheses without being function calls
const PAREN_KEYWORDS: &[&str] = &[
    "IN", "VALUES", "EXISTS", "AS", "OVER", "USING", "ON", "AND", "OR", "NOT", "WHERE",
    "SELECT", "FROM", "JOIN", "TABLE", "INTO", "KEY", "REFERENCES", "ANY", "ALL", "SOME",
    "FILTER", "WITHIN", "WITH", "UNION", "INTERSECT", "EXCEPT", "THEN", "ELSE", "WHEN",
    "RETURNING", "LATERAL", "UNNEST", "ROWS", "RANGE", "PARTITION", "BY", "SET", "HAVING",
];

/// Clause keywords that can follow a table reference but are never names or aliases
const CLAUSE_KEYWORDS: &[&str] = &[
    "WHERE", "ON", "USING", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS",
    "NATURAL", "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "UNION", "INTERSECT",
    "EXCEPT", "WINDOW", "QUALIFY", "SET", "VALUES", "SELECT", "FROM", "AS", "WITH",
    "RETURNING", "LATERAL", "FETCH", "FOR", "INTO", "WHEN", "THEN", "ELSE", "END", "AND",
    "OR", "NOT", "DEFAULT",
];

fn is_clause_keyword(word: &str) -> bool {
    CLAUSE_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(word))
}

fn unquote(part: &str) -> String {
    part.trim()
        .trim_matches(|c| c == '"' || c == '`' || c == '[' || c == ']')
        .to_string()
}

/// Scan raw SQL text for table references, table aliases and function calls
pub fn salvage_nodes(sql: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut table_names = HashSet::new();

    for caps in TABLE_REF_RE.captures_iter(sql) {
        let Some(raw) = caps.get(1) else { continue };
        let parts: Vec<String> = raw.as_str().split('.').map(unquote).collect();
        let table = TableRef::new(parts);
        if is_clause_keyword(raw.as_str()) {
            continue;
        }
        table_names.insert(table.qualified().to_lowercase());

        if let Some(alias) = caps.get(2) {
            if !is_clause_keyword(alias.as_str()) {
                nodes.push(Node::Alias(AliasBinding {
                    alias: alias.as_str().to_string(),
                    target: table.name().to_string(),
                    kind: AliasKind::Table,
                }));
            }
        }
        nodes.push(Node::Table(table));
    }

    for caps in FUNCTION_CALL_RE.captures_iter(sql) {
        let Some(name) = caps.get(1) else { continue };
        let upper = name.as_str().to_uppercase();
        if PAREN_KEYWORDS.contains(&upper.as_str())
            || table_names.contains(&name.as_str().to_lowercase())
        {
            continue;
        }
        nodes.push(Node::Function(FunctionCall { name: upper }));
    }

    nodes
}
