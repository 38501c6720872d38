//! Error types for chain resolution.
//!
//! The chain engine itself cannot fail. Everything here originates at the
//! date source boundary or in configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Unknown association: {0}")]
    UnknownAssociation(String),

    #[error("Record in {association} has no column {column}")]
    MissingColumn { association: String, column: String },

    #[error("Malformed timestamp in column {column}: {value}")]
    MalformedTimestamp { column: String, value: String },

    #[error("Malformed record at {association}:{line}: {reason}")]
    MalformedRecord {
        association: String,
        line: usize,
        reason: String,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Date source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;
