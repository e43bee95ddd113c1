//! CNPJ Loader Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging setup for the cnpj-loader workspace.
//!
//! # Example
//!
//! ```no_run
//! use cnpj_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env();
//!     init_logging(&config)?;
//!     tracing::info!("starting up");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CnpjError, Result};
