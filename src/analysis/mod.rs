//! Semantic analysis of parsed SQL against a schema

mod batch;
mod hallucination;
mod join_paths;
mod results;
mod schema_validator;

pub use batch::{validate_batch, BatchEntry, QueryInput};
pub use hallucination::{
    detect, detect_identifiers, detect_tree, validate, DEGRADED_PARSE_WARNING,
};
pub use join_paths::{join_checks, join_checks_tree, valid_join_paths, verify_joins};
pub use results::{HallucinationReport, JoinCheck, ValidationResult};
pub use schema_validator::validate_identifiers;
