//! Consumers of cleaned datasets.
//!
//! The pipeline hands every [`CleanedDataset`] to a [`DatasetSink`] once its
//! report is built. Nothing is written unless a sink is configured.

use crate::error::{Result, ResultExt};
use crate::types::CleanedDataset;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Receives each cleaned dataset.
pub trait DatasetSink: Send + Sync {
    /// Consume one dataset. Returns where it was stored, if anywhere.
    fn consume(&self, dataset: &CleanedDataset) -> Result<Option<PathBuf>>;
}

/// Writes `<stem>_clean.csv` into a directory.
#[derive(Debug, Clone)]
pub struct CsvExportSink {
    output_dir: PathBuf,
}

impl CsvExportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path the dataset named `file_name` is written to.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        self.output_dir.join(format!("{}_clean.csv", stem))
    }
}

impl DatasetSink for CsvExportSink {
    fn consume(&self, dataset: &CleanedDataset) -> Result<Option<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_path(&dataset.name);
        let mut file = File::create(&output_path)?;

        let mut frame = dataset.frame.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut frame)
            .context(format!("Failed to write '{}'", output_path.display()))?;

        info!("Dataset saved: {}", output_path.display());
        Ok(Some(output_path))
    }
}

/// Keeps cleaned datasets in memory, in the order they arrive.
#[derive(Debug, Default)]
pub struct CollectingSink {
    datasets: Mutex<Vec<CleanedDataset>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything collected so far.
    pub fn take(&self) -> Vec<CleanedDataset> {
        match self.datasets.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl DatasetSink for CollectingSink {
    fn consume(&self, dataset: &CleanedDataset) -> Result<Option<PathBuf>> {
        let mut guard = match self.datasets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(dataset.clone());
        Ok(None)
    }
}
