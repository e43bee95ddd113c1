//! Error types for the load pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors raised while loading one source file into its destination table.
///
/// Every variant that can occur inside a file's pipeline is caught at the
/// table-loader boundary and recorded in the load report; none of them
/// aborts the run.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open source file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file {path} is not valid {encoding}")]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("malformed delimited data in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("row width {actual} does not match the {expected} declared columns of table {table}")]
    ShapeMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("transform failed for table {table}, column {column}: {message}")]
    Transform {
        table: String,
        column: String,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a transform error with table and column context
    pub fn transform(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transform {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }
}
