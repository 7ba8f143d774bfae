//! On-disk cache of the cleaned table

use crate::data::CleanedTable;
use crate::error::Result;
use polars::prelude::*;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Extension of every cache artifact
pub const CACHE_EXTENSION: &str = "csv";

/// Directory of cleaned tables stored as comma-separated text, one file per name
#[derive(Debug, Clone)]
pub struct TabularCache {
    dir: PathBuf,
}

impl TabularCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of the artifact stored under `name`
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, CACHE_EXTENSION))
    }

    /// Load the table stored under `name`.
    ///
    /// Returns `Ok(None)` when no artifact exists; a present but malformed
    /// file is an error.
    pub fn load(&self, name: &str) -> Result<Option<CleanedTable>> {
        let path = self.path(name);
        if !path.is_file() {
            debug!(path = %path.display(), "cache miss");
            return Ok(None);
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.clone()))?
            .finish()?;
        let table = CleanedTable::from_dataframe(&df)?;

        info!(path = %path.display(), rows = table.len(), "loaded cached table");
        Ok(Some(table))
    }

    /// Store `table` under `name`, replacing any previous artifact
    pub fn store(&self, table: &CleanedTable, name: &str) -> Result<()> {
        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir)?;
        }

        let path = self.path(name);
        let mut df = table.to_dataframe()?;
        let mut file = fs::File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;

        info!(path = %path.display(), rows = table.len(), "stored cleaned table");
        Ok(())
    }
}
