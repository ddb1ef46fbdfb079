//! Result value objects produced by the analyzers

use serde::Serialize;

/// Phantom identifiers found in one SQL text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HallucinationReport {
    pub phantom_tables: Vec<String>,
    pub phantom_columns: Vec<String>,
    pub phantom_functions: Vec<String>,
    pub total_hallucinations: usize,
    /// phantoms / max(1, identifiers examined), always within [0, 1]
    pub hallucination_score: f64,
}

impl HallucinationReport {
    pub fn new(
        phantom_tables: Vec<String>,
        phantom_columns: Vec<String>,
        phantom_functions: Vec<String>,
        examined: usize,
    ) -> Self {
        let total_hallucinations =
            phantom_tables.len() + phantom_columns.len() + phantom_functions.len();
        let hallucination_score = total_hallucinations as f64 / examined.max(1) as f64;
        Self {
            phantom_tables,
            phantom_columns,
            phantom_functions,
            total_hallucinations,
            hallucination_score,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.total_hallucinations == 0
    }
}

/// Outcome of validating SQL against a schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hallucination_report: Option<HallucinationReport>,
}

impl ValidationResult {
    /// `is_valid` is derived from `errors`
    pub fn new(
        errors: Vec<String>,
        warnings: Vec<String>,
        hallucination_report: Option<HallucinationReport>,
    ) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            hallucination_report,
        }
    }

    pub fn valid() -> Self {
        Self::new(Vec::new(), Vec::new(), None)
    }
}

/// One ON-clause equality of a join, checked against declared foreign keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinCheck {
    /// Bare name of the joined table
    pub joined_table: String,
    /// Left operand, `table.column` when its table is known
    pub left: String,
    /// Right operand, `table.column` when its table is known
    pub right: String,
    /// Whether a foreign key links the two sides in either direction.
    /// Pairs with an unqualified side cannot be checked and count as linked.
    pub has_foreign_key_path: bool,
}
