//! Error types for the docindex library.
//!
//! All fallible operations return [`DocIndexError`] through the [`Result`]
//! alias. Request handlers never surface these to clients directly; the
//! dispatcher renders them as plain text responses.
//!
//! # Examples
//!
//! ```
//! use docindex::error::{DocIndexError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(DocIndexError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

use crate::document::DocId;

/// The main error type for docindex operations.
#[derive(Error, Debug)]
pub enum DocIndexError {
    /// I/O errors (channel, persistence and document files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The index already holds its maximum number of documents.
    #[error("Index capacity exceeded: at most {0} documents")]
    CapacityExceeded(usize),

    /// No document carries the requested id.
    #[error("Document {0} not found")]
    NotFound(DocId),

    /// A document path that would leave the document root.
    #[error("Path outside document root: {0}")]
    OutsideRoot(String),

    /// A request frame could not be encoded or decoded.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Malformed arguments.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A subprocess or worker thread could not be started.
    #[error("Spawn error: {0}")]
    Spawn(String),

    /// Search setup or aggregation failure.
    #[error("Search error: {0}")]
    Search(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with DocIndexError.
pub type Result<T> = std::result::Result<T, DocIndexError>;

impl DocIndexError {
    /// Create a new invalid frame error.
    pub fn invalid_frame<S: Into<String>>(msg: S) -> Self {
        DocIndexError::InvalidFrame(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        DocIndexError::InvalidArgument(msg.into())
    }

    /// Create a new spawn error.
    pub fn spawn<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Spawn(msg.into())
    }

    /// Create a new search error.
    pub fn search<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Search(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DocIndexError::Other(msg.into())
    }

    /// Whether this error means the requested document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocIndexError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = DocIndexError::invalid_argument("bad id");
        assert_eq!(error.to_string(), "Invalid argument: bad id");

        let error = DocIndexError::NotFound(7);
        assert_eq!(error.to_string(), "Document 7 not found");
        assert!(error.is_not_found());

        let error = DocIndexError::CapacityExceeded(2500);
        assert_eq!(
            error.to_string(),
            "Index capacity exceeded: at most 2500 documents"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = DocIndexError::from(io_error);

        match error {
            DocIndexError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
