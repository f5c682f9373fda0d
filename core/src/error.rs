//! Error types for registry lookups and row shaping.
//!
//! All failures here are raised before any query text is built or any row
//! is partially processed.

use thiserror::Error;

/// Errors that can occur while validating identifiers or shaping rows.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Table name is not part of the Collections schema.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// Column name is not part of the given table.
    #[error("unknown column '{column}' for table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// A value or row had the wrong shape for the requested operation.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A mapping did not contain the requested field.
    #[error("missing field: {0}")]
    MissingField(String),

    /// A record passed for linking has no usable id.
    #[error("record has no id")]
    MissingId,

    /// JSON decoding of a blob field failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
