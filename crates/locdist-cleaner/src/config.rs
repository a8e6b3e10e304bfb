//! Configuration for a cleaning run.
//!
//! Built with [`CleaningConfig::builder()`]; the CLI maps its flags onto the
//! builder one to one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file name prefix of the exports.
pub const DEFAULT_FILE_PREFIX: &str = "Locationdistance_eb2prod_";

/// Default number of numbered files in a batch.
pub const DEFAULT_DATASET_COUNT: usize = 7;

/// Configuration for a batch of datasets.
///
/// # Example
///
/// ```rust,ignore
/// use locdist_cleaner::CleaningConfig;
///
/// let config = CleaningConfig::builder()
///     .base_dir("/data/exports")
///     .group_by_user(true)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Directory holding the numbered CSV files.
    pub base_dir: PathBuf,

    /// File name prefix; dataset `i` is read from `{prefix}{i}.csv`.
    /// Default: "Locationdistance_eb2prod_"
    pub file_prefix: String,

    /// Number of datasets, numbered from 1.
    /// Default: 7
    pub dataset_count: usize,

    /// Interpolate within each user's stream instead of across the whole
    /// timestamp-sorted table.
    /// Default: false
    pub group_by_user: bool,

    /// Clean datasets concurrently, one task per dataset.
    /// Default: false
    pub parallel: bool,

    /// Where to write cleaned CSVs. None keeps results in memory only.
    /// Default: None
    pub export_dir: Option<PathBuf>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            dataset_count: DEFAULT_DATASET_COUNT,
            group_by_user: false,
            parallel: false,
            export_dir: None,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.dataset_count == 0 {
            return Err(ConfigValidationError::InvalidDatasetCount(
                self.dataset_count,
            ));
        }

        if self.file_prefix.contains(['/', '\\']) {
            return Err(ConfigValidationError::InvalidFilePrefix(
                self.file_prefix.clone(),
            ));
        }

        Ok(())
    }

    /// File name of dataset `index` (1-based).
    pub fn file_name(&self, index: usize) -> String {
        format!("{}{}.csv", self.file_prefix, index)
    }

    /// Full paths of every dataset in batch order.
    pub fn dataset_paths(&self) -> Vec<PathBuf> {
        (1..=self.dataset_count)
            .map(|i| self.base_dir.join(self.file_name(i)))
            .collect()
    }

    pub fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid dataset count: {0} (must be at least 1)")]
    InvalidDatasetCount(usize),

    #[error("Invalid file prefix '{0}': must not contain path separators")]
    InvalidFilePrefix(String),
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    base_dir: Option<PathBuf>,
    file_prefix: Option<String>,
    dataset_count: Option<usize>,
    group_by_user: Option<bool>,
    parallel: Option<bool>,
    export_dir: Option<PathBuf>,
}

impl CleaningConfigBuilder {
    /// Set the directory that holds the numbered files.
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(path.into());
        self
    }

    /// Set the file name prefix.
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
        self
    }

    /// Set how many numbered files make up the batch.
    pub fn dataset_count(mut self, count: usize) -> Self {
        self.dataset_count = Some(count);
        self
    }

    /// Enable or disable per-user interpolation.
    ///
    /// Off by default: the table is sorted by timestamp alone, so a gap in
    /// one user's stream may be filled from a neighbouring row of another
    /// user.
    pub fn group_by_user(mut self, enable: bool) -> Self {
        self.group_by_user = Some(enable);
        self
    }

    /// Enable or disable concurrent processing of datasets.
    pub fn parallel(mut self, enable: bool) -> Self {
        self.parallel = Some(enable);
        self
    }

    /// Write each cleaned dataset as CSV into `path`.
    pub fn export_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            base_dir: self.base_dir.unwrap_or_else(|| PathBuf::from(".")),
            file_prefix: self
                .file_prefix
                .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string()),
            dataset_count: self.dataset_count.unwrap_or(DEFAULT_DATASET_COUNT),
            group_by_user: self.group_by_user.unwrap_or(false),
            parallel: self.parallel.unwrap_or(false),
            export_dir: self.export_dir,
        };

        config.validate()?;
        Ok(config)
    }
}
