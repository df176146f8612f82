use std::collections::BTreeMap;

use thiserror::Error;

/// Field name -> messages collected while validating a request.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum PathfindingError {
    #[error("algorithm `{0}` not found")]
    UnknownAlgorithm(String),
    #[error("unknown heuristic `{0}`, expected one of: manhattan, euclidean, diagonal")]
    UnknownHeuristic(String),
    #[error("validation failed: {}", describe(.0))]
    Validation(ValidationErrors),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn describe(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, PathfindingError>;
