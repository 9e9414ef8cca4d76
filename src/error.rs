//! Error types for the remediation engine

use thiserror::Error;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine-wide error type
///
/// Classification and recommendation never fail on "no match" — an empty
/// result list is a valid outcome, not an error. These variants cover
/// configuration mistakes and invalid mutations only.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("solution not found: {0}")]
    SolutionNotFound(String),

    #[error("unknown issue category: {0}")]
    UnknownCategory(String),

    #[error("duplicate solution id: {0}")]
    DuplicateId(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model schema version mismatch: found {found}, expected {expected}")]
    ModelVersionMismatch { found: u32, expected: u32 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
