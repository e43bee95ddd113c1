//! File manifest: which source files feed which table
//!
//! RFB dump files carry an uppercase dataset token in their names (for
//! example `K3241.K03200Y0.D40413.EMPRECSV`), so a manifest can either be
//! assembled explicitly or scanned from a data directory.

use crate::catalog::Catalog;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Dataset token embedded in the file names of one table's source files
pub fn dataset_token(table_name: &str) -> Option<&'static str> {
    match table_name {
        "empresa" => Some("EMPRECSV"),
        "estabelecimento" => Some("ESTABELE"),
        "socios" => Some("SOCIOCSV"),
        "simples" => Some("SIMPLES"),
        "cnae" => Some("CNAECSV"),
        "moti" => Some("MOTICSV"),
        "munic" => Some("MUNICCSV"),
        "natju" => Some("NATJUCSV"),
        "pais" => Some("PAISCSV"),
        "quals" => Some("QUALSCSV"),
        _ => None,
    }
}

/// Mapping from table name to the ordered list of file names to load,
/// resolved against a base directory.
#[derive(Debug, Clone)]
pub struct FileManifest {
    base_dir: PathBuf,
    files: BTreeMap<String, Vec<String>>,
}

impl FileManifest {
    /// Empty manifest rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            files: BTreeMap::new(),
        }
    }

    /// Assign a table's file list explicitly
    pub fn insert(&mut self, table_name: impl Into<String>, files: Vec<String>) {
        self.files.insert(table_name.into(), files);
    }

    /// File names queued for one table (empty when none were found)
    pub fn files_for(&self, table_name: &str) -> &[String] {
        self.files
            .get(table_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolve a file name against the base directory
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }

    /// Total number of queued files across all tables
    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Build a manifest by scanning `base_dir` and matching each file name
    /// against the catalog tables' dataset tokens. File lists are sorted so
    /// repeated runs load in the same order.
    pub fn scan(base_dir: impl AsRef<Path>, catalog: &Catalog) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let mut manifest = Self::new(base_dir);

        let mut names = Vec::new();
        for entry in std::fs::read_dir(base_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        for descriptor in catalog.tables() {
            let Some(token) = dataset_token(descriptor.table_name) else {
                continue;
            };
            let matched: Vec<String> = names
                .iter()
                .filter(|n| n.to_uppercase().contains(token))
                .cloned()
                .collect();
            manifest.insert(descriptor.table_name, matched);
        }

        Ok(manifest)
    }
}
