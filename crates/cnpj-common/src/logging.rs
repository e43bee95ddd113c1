//! Logging configuration and initialization
//!
//! Centralized `tracing` setup for every binary in the workspace. Supports
//! console output, an optional rolling log file, text or JSON formatting,
//! and environment-based configuration. Components should use the
//! structured macros (`info!`, `warn!`, ...) with fields rather than
//! `println!`:
//!
//! ```rust,ignore
//! tracing::info!(table = %descriptor.table_name, file = %name, "loading file");
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,

    /// Log format (text or JSON)
    pub format: LogFormat,

    /// Optional log file; when set, output goes to both console and a
    /// daily-rotated file in the file's parent directory
    pub log_file: Option<PathBuf>,

    /// Additional filter directives (e.g., "sqlx=warn")
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            log_file: None,
            filter_directives: None,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    ///
    /// - `CNPJ_LOG_LEVEL`: trace, debug, info, warn, error
    /// - `CNPJ_LOG_FORMAT`: text, json
    /// - `CNPJ_LOG_FILE`: path to a log file (enables file output)
    /// - `CNPJ_LOG_FILTER`: extra filter directives
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(level) = std::env::var("CNPJ_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.level = level;
        }

        if let Some(format) = std::env::var("CNPJ_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.format = format;
        }

        if let Ok(file) = std::env::var("CNPJ_LOG_FILE") {
            config.log_file = Some(PathBuf::from(file));
        }

        if let Ok(filter) = std::env::var("CNPJ_LOG_FILTER") {
            config.filter_directives = Some(filter);
        }

        config
    }

    /// Override the minimum level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

/// Initialize the global tracing subscriber
///
/// Must be called once at startup, before any log statements.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut filter =
        EnvFilter::from_default_env().add_directive(config.level.to_tracing_level().into());

    if let Some(ref directives) = config.filter_directives {
        for directive in directives.split(',') {
            filter = filter.add_directive(
                directive
                    .parse()
                    .context("Failed to parse filter directive")?,
            );
        }
    }

    match &config.log_file {
        None => init_console_logging(config, filter),
        Some(path) => init_both_logging(config, path, filter),
    }
}

/// Initialize console-only logging
fn init_console_logging(config: &LogConfig, filter: EnvFilter) -> Result<()> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .try_init()?;
        },
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer.json())
                .try_init()?;
        },
    }

    Ok(())
}

/// Initialize console plus rolling-file logging.
///
/// The layers are built inside each format arm so every layer's subscriber
/// type is inferred against the stack it actually joins.
fn init_both_logging(config: &LogConfig, path: &std::path::Path, filter: EnvFilter) -> Result<()> {
    let non_blocking = file_writer(path)?;

    match config.format {
        LogFormat::Text => {
            let console_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE);

            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .try_init()?;
        },
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE);

            let file_layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(file_layer)
                .try_init()?;
        },
    }

    Ok(())
}

/// Build the daily-rotated, non-blocking file writer
fn file_writer(path: &std::path::Path) -> Result<tracing_appender::non_blocking::NonBlocking> {
    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let prefix = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cnpj-loader".to_string());

    std::fs::create_dir_all(dir).context("Failed to create log directory")?;

    let file_appender = tracing_appender::rolling::daily(dir, prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the writer on drop; keep it alive for the whole
    // process lifetime.
    std::mem::forget(guard);

    Ok(non_blocking)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("invalid".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_with_level() {
        let config = LogConfig::default().with_level(LogLevel::Debug);
        assert_eq!(config.level, LogLevel::Debug);
    }

    // The one subscriber installation this test process gets: the
    // json-with-file stack, which stacks a json console layer and a json
    // file layer on the same registry.
    #[test]
    fn test_init_json_with_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            level: LogLevel::Debug,
            format: LogFormat::Json,
            log_file: Some(dir.path().join("cnpj-test.log")),
            filter_directives: None,
        };

        init_logging(&config).unwrap();
        tracing::info!("subscriber installed");
    }
}
