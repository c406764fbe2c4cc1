use thiserror::Error;

use crate::parser::ParseError;

/// Errors surfaced while turning a description into a model.
///
/// Evaluation has no error path; an underivable query is a plain `false`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("rule {rule} concludes `{fact}`, which is also one of its own antecedents")]
    CycleInvariant { rule: usize, fact: String },
    #[error("description: {0}")]
    Json(#[from] serde_json::Error),
}
