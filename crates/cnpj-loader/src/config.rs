//! Loader configuration

use crate::db::DbConfig;
use crate::error::{LoadError, Result};
use std::path::PathBuf;

/// Default number of rows per chunk, constant across all files and tables
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Default directory holding the extracted dump files
pub const DEFAULT_DATA_DIR: &str = "./data";

/// What to do when one table fails outright (for example the drop
/// statement itself errors). Per-file failures are always isolated and
/// never governed by this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailMode {
    /// Record the failure and move on to the next table
    #[default]
    Continue,
    /// Stop the run after the failing table
    Abort,
}

impl std::str::FromStr for FailMode {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(FailMode::Continue),
            "abort" => Ok(FailMode::Abort),
            _ => Err(LoadError::config(format!("invalid fail mode: {}", s))),
        }
    }
}

/// Full configuration for one load run
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub database: DbConfig,
    pub data_dir: PathBuf,
    pub chunk_size: usize,
    pub fail_mode: FailMode,
    /// Render progress bars (disable for non-interactive runs)
    pub progress: bool,
}

impl LoaderConfig {
    /// Load configuration from the environment, with `.env` support.
    ///
    /// - `DATABASE_URL` (required), `CNPJ_DB_*` (see [`DbConfig`])
    /// - `CNPJ_DATA_DIR`: directory of extracted dump files
    /// - `CNPJ_CHUNK_SIZE`: rows per chunk
    /// - `CNPJ_FAIL_MODE`: `continue` or `abort`
    /// - `CNPJ_PROGRESS`: `true`/`false`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DbConfig::from_env()?;

        let data_dir = std::env::var("CNPJ_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let chunk_size = match std::env::var("CNPJ_CHUNK_SIZE") {
            Ok(s) => s
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| LoadError::config(format!("invalid CNPJ_CHUNK_SIZE: {}", s)))?,
            Err(_) => DEFAULT_CHUNK_SIZE,
        };

        let fail_mode = match std::env::var("CNPJ_FAIL_MODE") {
            Ok(s) => s.parse()?,
            Err(_) => FailMode::default(),
        };

        let progress = std::env::var("CNPJ_PROGRESS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        Ok(Self {
            database,
            data_dir,
            chunk_size,
            fail_mode,
            progress,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_mode_from_str() {
        assert_eq!("continue".parse::<FailMode>().unwrap(), FailMode::Continue);
        assert_eq!("ABORT".parse::<FailMode>().unwrap(), FailMode::Abort);
        assert!("explode".parse::<FailMode>().is_err());
    }

    #[test]
    fn test_fail_mode_default_is_continue() {
        assert_eq!(FailMode::default(), FailMode::Continue);
    }
}
