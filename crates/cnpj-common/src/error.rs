//! Error types shared across the cnpj-loader workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CnpjError>;

/// Errors raised outside the load pipeline itself (configuration,
/// filesystem plumbing, logging setup)
#[derive(Error, Debug)]
pub enum CnpjError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl CnpjError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
