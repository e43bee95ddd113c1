//! CNPJ Loader Library
//!
//! Chunked, bounded-memory ingestion of the Receita Federal CNPJ open-data
//! dumps into Postgres.
//!
//! The pipeline for one file is chunk reader -> row normalizer -> bulk
//! writer, with a progress tracker observing the row counter. A table is
//! dropped once, then every one of its files appends; failures are isolated
//! per file so one bad file never aborts a multi-file, multi-table run.
//! Secondary indices on `cnpj_basico` are created once all tables finish.
//!
//! # Example
//!
//! ```no_run
//! use cnpj_loader::{
//!     catalog::Catalog, config::LoaderConfig, db, index, loader::DatabaseLoader,
//!     manifest::FileManifest, writer::BulkWriter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LoaderConfig::from_env()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let catalog = Catalog::rfb();
//!     let manifest = FileManifest::scan(&config.data_dir, &catalog)?;
//!
//!     let loader = DatabaseLoader::new(BulkWriter::new(pool.clone()), catalog, &config);
//!     let report = loader.run(&manifest).await;
//!     anyhow::ensure!(!report.has_failures(), "some files failed to load");
//!
//!     index::build_indices(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod chunk;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod loader;
pub mod manifest;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod writer;

// Re-export commonly used types
pub use catalog::{Catalog, TableDescriptor, Transform};
pub use error::{LoadError, Result};
pub use loader::{DatabaseLoader, LoadReport, TableLoader};
