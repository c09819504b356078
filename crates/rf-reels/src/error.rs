//! Error types for reel setup

use thiserror::Error;

/// Setup error type
///
/// Only construction is fallible. Once a machine exists, every runtime
/// operation is total and misuse is ignored rather than reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReelError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Symbol alphabet is empty")]
    EmptyAlphabet,

    #[error("Duplicate symbol in alphabet: {0}")]
    DuplicateSymbol(String),

    #[error("Wild symbol {0:?} is not part of the alphabet")]
    UnknownWild(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ReelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias
pub type ReelResult<T> = Result<T, ReelError>;
