//! cnpj-loader - bulk loader for the CNPJ open-data dumps

use anyhow::Result;
use clap::{Parser, Subcommand};
use cnpj_common::logging::{init_logging, LogConfig, LogLevel};
use cnpj_loader::catalog::Catalog;
use cnpj_loader::config::LoaderConfig;
use cnpj_loader::index;
use cnpj_loader::loader::DatabaseLoader;
use cnpj_loader::manifest::FileManifest;
use cnpj_loader::writer::BulkWriter;
use cnpj_loader::{db, LoadReport};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cnpj-loader")]
#[command(author, version, about = "Bulk loader for Receita Federal CNPJ open data")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop, reload and index every table of the catalog
    Load {
        /// Directory with the extracted dump files (overrides CNPJ_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Rows per chunk (overrides CNPJ_CHUNK_SIZE)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Skip index creation after loading
        #[arg(long)]
        skip_indices: bool,
    },

    /// Only (re)create the secondary indices
    Index,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    init_logging(&log_config)?;

    let mut config = LoaderConfig::from_env()?;
    let pool = db::create_pool(&config.database).await?;

    match cli.command {
        Command::Load {
            data_dir,
            chunk_size,
            skip_indices,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(size) = chunk_size {
                anyhow::ensure!(size > 0, "chunk size must be positive");
                config.chunk_size = size;
            }

            let catalog = Catalog::rfb();
            let manifest = FileManifest::scan(&config.data_dir, &catalog)?;
            info!(
                data_dir = %config.data_dir.display(),
                files = manifest.file_count(),
                chunk_size = config.chunk_size,
                "starting load"
            );

            let loader = DatabaseLoader::new(BulkWriter::new(pool.clone()), catalog, &config);
            let report = loader.run(&manifest).await;
            summarize(&report);

            let index_report = if skip_indices {
                None
            } else {
                let index_report = index::build_indices(&pool).await?;
                for failure in index_report.failures() {
                    warn!(index = %failure.index, table = %failure.table, "index not created");
                }
                Some(index_report)
            };

            if run_failed(&report, index_report.as_ref()) {
                anyhow::bail!("load finished with failures; see the log for details");
            }
        },
        Command::Index => {
            let report = index::build_indices(&pool).await?;
            if report.has_failures() {
                for failure in report.failures() {
                    warn!(index = %failure.index, table = %failure.table, "index not created");
                }
                anyhow::bail!("index creation finished with failures");
            }
        },
    }

    info!("done");
    Ok(())
}

/// Whether the run as a whole should exit non-zero: any load failure, or
/// any index that could not be created
fn run_failed(load: &LoadReport, indices: Option<&cnpj_loader::index::IndexReport>) -> bool {
    load.has_failures() || indices.map(|r| r.has_failures()).unwrap_or(false)
}

/// Log a per-table summary of the run
fn summarize(report: &LoadReport) {
    for table in &report.tables {
        if let Some(ref fatal) = table.fatal {
            warn!(table = %table.table, error = %fatal, "table failed outright");
            continue;
        }
        info!(
            table = %table.table,
            rows = table.rows_loaded(),
            failed_files = table.failed_files().count(),
            "table summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnpj_loader::index::{IndexOutcome, IndexReport, IndexStatus};

    fn index_report(status: IndexStatus) -> IndexReport {
        IndexReport {
            outcomes: vec![IndexOutcome {
                index: "empresa_cnpj".to_string(),
                table: "empresa".to_string(),
                status,
            }],
        }
    }

    #[test]
    fn test_index_failure_fails_the_load_run() {
        let load = LoadReport::default();
        assert!(!run_failed(&load, None));
        assert!(!run_failed(&load, Some(&index_report(IndexStatus::Created))));
        assert!(!run_failed(
            &load,
            Some(&index_report(IndexStatus::AlreadyExists))
        ));
        assert!(run_failed(
            &load,
            Some(&index_report(IndexStatus::Failed("boom".to_string())))
        ));
    }
}
