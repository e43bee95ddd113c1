//! Load orchestration
//!
//! `TableLoader` runs reader -> normalizer -> progress -> writer for one
//! table's files; `DatabaseLoader` walks the whole catalog. Failures inside
//! one file's pipeline are caught here, recorded, and the next file is
//! attempted. Rows a failed file committed before the failure stay in the
//! table; there is no per-file rollback.

use crate::catalog::{Catalog, TableDescriptor};
use crate::chunk::ChunkReader;
use crate::config::{FailMode, LoaderConfig};
use crate::error::{LoadError, Result};
use crate::manifest::FileManifest;
use crate::normalize::normalize;
use crate::progress::{estimate_row_count, ProgressTracker};
use crate::writer::TableSink;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Result of loading one source file
#[derive(Debug)]
pub struct FileOutcome {
    pub file: String,
    /// Rows committed, including rows a failed file wrote before its error
    pub rows: u64,
    pub error: Option<LoadError>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of loading one table
#[derive(Debug)]
pub struct TableReport {
    pub table: String,
    pub files: Vec<FileOutcome>,
    /// Set when the table could not be loaded at all (e.g. the drop failed)
    pub fatal: Option<LoadError>,
}

impl TableReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            files: Vec::new(),
            fatal: None,
        }
    }

    pub fn rows_loaded(&self) -> u64 {
        self.files.iter().map(|f| f.rows).sum()
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_ok())
    }

    pub fn has_failures(&self) -> bool {
        self.fatal.is_some() || self.files.iter().any(|f| !f.is_ok())
    }
}

/// Accumulated result of one whole run
#[derive(Debug, Default)]
pub struct LoadReport {
    pub tables: Vec<TableReport>,
}

impl LoadReport {
    pub fn rows_loaded(&self) -> u64 {
        self.tables.iter().map(|t| t.rows_loaded()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.tables.iter().any(|t| t.has_failures())
    }

    pub fn failed_tables(&self) -> impl Iterator<Item = &TableReport> {
        self.tables.iter().filter(|t| t.has_failures())
    }
}

/// Loads one table from its ordered file list
pub struct TableLoader<'a, S> {
    writer: &'a S,
    chunk_size: usize,
    show_progress: bool,
}

impl<'a, S: TableSink> TableLoader<'a, S> {
    pub fn new(writer: &'a S, chunk_size: usize, show_progress: bool) -> Self {
        Self {
            writer,
            chunk_size,
            show_progress,
        }
    }

    /// Drop the destination table once, then load every file in order.
    /// Per-file errors are recorded and do not stop the remaining files.
    pub async fn load(&self, descriptor: &TableDescriptor, manifest: &FileManifest) -> TableReport {
        let mut report = TableReport::new(descriptor.table_name);
        let started = Instant::now();

        info!(
            table = descriptor.table_name,
            label = descriptor.label,
            "loading table"
        );

        if let Err(e) = self.writer.drop_table(descriptor.table_name).await {
            warn!(table = descriptor.table_name, error = %e, "cannot drop destination table");
            report.fatal = Some(e);
            return report;
        }

        for file in manifest.files_for(descriptor.table_name) {
            let path = manifest.resolve(file);
            match self.load_file(descriptor, &path, file).await {
                Ok(rows) => {
                    info!(table = descriptor.table_name, file = %file, rows, "file loaded");
                    report.files.push(FileOutcome {
                        file: file.clone(),
                        rows,
                        error: None,
                    });
                },
                Err((rows, e)) => {
                    warn!(
                        table = descriptor.table_name,
                        file = %file,
                        rows_committed = rows,
                        error = %e,
                        "failed to load file"
                    );
                    report.files.push(FileOutcome {
                        file: file.clone(),
                        rows,
                        error: Some(e),
                    });
                },
            }
        }

        info!(
            table = descriptor.table_name,
            rows = report.rows_loaded(),
            files = report.files.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "table finished"
        );

        report
    }

    /// Run the full pipeline for one file. On error, reports how many rows
    /// earlier chunks had already committed.
    async fn load_file(
        &self,
        descriptor: &TableDescriptor,
        path: &Path,
        label: &str,
    ) -> std::result::Result<u64, (u64, LoadError)> {
        let mut written = 0u64;
        match self.run_file(descriptor, path, label, &mut written).await {
            Ok(()) => Ok(written),
            Err(e) => Err((written, e)),
        }
    }

    async fn run_file(
        &self,
        descriptor: &TableDescriptor,
        path: &Path,
        label: &str,
        written: &mut u64,
    ) -> Result<()> {
        let estimate = estimate_row_count(path)?;
        let mut progress = ProgressTracker::new(estimate, label, self.show_progress);
        let mut reader = ChunkReader::open(path, descriptor.encoding, self.chunk_size)?;
        let mut table_ready = false;

        while let Some(raw) = reader.next_chunk()? {
            let batch = normalize(raw, descriptor)?;

            // The destination schema is implied by the transform output, so
            // the table can only be created once the first batch exists.
            if !table_ready {
                self.writer
                    .ensure_table(descriptor.table_name, &batch.columns)
                    .await?;
                table_ready = true;
            }

            *written += self
                .writer
                .append_chunk(descriptor.table_name, &batch)
                .await?;
            progress.update(*written);
        }

        progress.finish(*written);
        Ok(())
    }
}

/// Loads every table of the catalog, in declared order
pub struct DatabaseLoader<S> {
    writer: S,
    catalog: Catalog,
    chunk_size: usize,
    fail_mode: FailMode,
    show_progress: bool,
}

impl<S: TableSink> DatabaseLoader<S> {
    pub fn new(writer: S, catalog: Catalog, config: &LoaderConfig) -> Self {
        Self {
            writer,
            catalog,
            chunk_size: config.chunk_size,
            fail_mode: config.fail_mode,
            show_progress: config.progress,
        }
    }

    /// Run the whole load. Per-file failures never stop the run; a
    /// table-level failure stops it only under `FailMode::Abort`.
    pub async fn run(&self, manifest: &FileManifest) -> LoadReport {
        let started = Instant::now();
        let table_loader = TableLoader::new(&self.writer, self.chunk_size, self.show_progress);
        let mut report = LoadReport::default();

        for descriptor in self.catalog.tables() {
            let table_report = table_loader.load(descriptor, manifest).await;
            let fatal = table_report.fatal.is_some();
            report.tables.push(table_report);

            if fatal && self.fail_mode == FailMode::Abort {
                warn!("aborting run after table-level failure (fail mode: abort)");
                break;
            }
        }

        info!(
            tables = report.tables.len(),
            rows = report.rows_loaded(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "load run finished"
        );

        report
    }
}
