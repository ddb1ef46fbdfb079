//! Validation of many queries against one schema

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::hallucination::validate;
use super::results::ValidationResult;
use crate::schema::Schema;

/// Minimum number of queries to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// A query to validate, identified by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryInput {
    pub id: String,
    pub sql: String,
}

impl QueryInput {
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sql: sql.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub id: String,
    pub result: ValidationResult,
}

/// Validate every query, preserving input order
pub fn validate_batch(queries: &[QueryInput], schema: &Schema, dialect: &str) -> Vec<BatchEntry> {
    let run = |query: &QueryInput| BatchEntry {
        id: query.id.clone(),
        result: validate(&query.sql, schema, dialect),
    };

    let entries: Vec<BatchEntry> = if queries.len() >= PARALLEL_THRESHOLD {
        queries.par_iter().map(run).collect()
    } else {
        queries.iter().map(run).collect()
    };

    let invalid = entries.iter().filter(|e| !e.result.is_valid).count();
    info!(total = entries.len(), invalid, "validated query batch");
    entries
}
