//! Error types for the curator library.
//!
//! All fallible operations return [`Result`], whose error type is [`CuratorError`].
//! Augmentation failures are deliberately absent from this enum: the augmenter
//! reports them through [`crate::augment::Augmentation::Unavailable`] instead.
//!
//! # Examples
//!
//! ```
//! use curator::error::{CuratorError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(CuratorError::out_of_range("vector 7 requested, store holds 3"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for curator operations.
#[derive(Error, Debug)]
pub enum CuratorError {
    /// I/O errors (file operations, stdin, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required resource (CSV, vector store, index file) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A vector index outside the store bounds, or a row/vector count mismatch.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Tabular input could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Index-related errors (missing, corrupt, or unwritable index).
    #[error("Index error: {0}")]
    Index(String),

    /// Query-related errors (syntax, invalid boost, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary segment encoding errors
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// CSV reader errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with CuratorError.
pub type Result<T> = std::result::Result<T, CuratorError>;

impl CuratorError {
    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        CuratorError::NotFound(msg.into())
    }

    /// Create a new out-of-range error.
    pub fn out_of_range<S: Into<String>>(msg: S) -> Self {
        CuratorError::OutOfRange(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        CuratorError::Parse(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        CuratorError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        CuratorError::Query(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        CuratorError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        CuratorError::Other(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        CuratorError::Other(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        CuratorError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Map an I/O error on `path` to [`CuratorError::NotFound`] when the file is
    /// missing, keeping every other kind as [`CuratorError::Io`].
    pub fn from_open(err: io::Error, path: &std::path::Path) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            CuratorError::NotFound(format!("{}", path.display()))
        } else {
            CuratorError::Io(err)
        }
    }
}
