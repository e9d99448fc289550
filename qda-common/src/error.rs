//! Common error types for the QDA report tools

use thiserror::Error;

/// Common result type for QDA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the QDA crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Category parent references contain a cycle
    #[error("Malformed category hierarchy: cycle among categories {category_ids:?}")]
    MalformedHierarchy { category_ids: Vec<i64> },

    /// A coded interval references a document missing from the length table
    #[error("Code {code_id}: coded interval references unknown document {document_id}")]
    MissingDocument { code_id: i64, document_id: i64 },

    /// A coded interval lies outside its document
    #[error(
        "Code {code_id}: interval [{start}, {end}) is outside document {document_id} of length {length}"
    )]
    IntervalOutOfBounds {
        code_id: i64,
        document_id: i64,
        start: i64,
        end: i64,
        length: usize,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
