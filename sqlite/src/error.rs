//! Error types for Collections database access.
//!
//! Provides a unified error type covering file location, database access,
//! backup I/O and row shaping failures.

use std::path::PathBuf;

use edge_collections_core::CoreError;
use thiserror::Error;

/// Errors that can occur while opening or querying the Collections database.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Neither the supplied path nor the default location exists.
    #[error("could not find Edge Collections database at {}", .0.display())]
    NotFound(PathBuf),

    /// The resolved path exists but is not a regular file.
    #[error("{} is not a file", .0.display())]
    InvalidPath(PathBuf),

    /// File I/O failure (backups, file manager launch).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unknown identifier, row shape mismatch or blob decoding failure.
    #[error(transparent)]
    RecordError(#[from] CoreError),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
