//! Missing-value reports.
//!
//! Each cleaned dataset gets a [`MissingValueReport`]: per column, how many
//! values were missing after sanitization, how many each imputation step
//! filled, and how many are still missing. A run over the whole batch
//! collects one [`DatasetOutcome`] per file into a [`BatchReport`], which
//! prints as text or serializes to JSON (`--json`).

use crate::cleaner::SanitizeStats;
use crate::error::{CleaningError, Result};
use crate::imputers::ImputationStats;
use crate::schema::{COLUMNS, measurement_columns};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Count nulls in each schema column present in `df`.
pub fn count_missing(df: &DataFrame) -> BTreeMap<String, usize> {
    COLUMNS
        .iter()
        .map(|(col, _)| *col)
        .filter_map(|col| {
            df.column(col)
                .ok()
                .map(|c| (col.to_string(), c.null_count()))
        })
        .collect()
}

/// Missing-value accounting for one cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueReport {
    pub file_name: String,
    pub rows: usize,
    /// Nulls per column right after sanitization, before any filling.
    pub missing_before: BTreeMap<String, usize>,
    /// Nulls per column in the cleaned table.
    pub missing_after: BTreeMap<String, usize>,
    /// Values recoded as missing by the sanitizer.
    pub sanitized: BTreeMap<String, usize>,
    pub interpolated: BTreeMap<String, usize>,
    pub median_filled: BTreeMap<String, usize>,
}

impl MissingValueReport {
    /// Assemble a report from the stage statistics and the final frame.
    pub fn build(
        file_name: impl Into<String>,
        missing_before: BTreeMap<String, usize>,
        cleaned: &DataFrame,
        sanitize: &SanitizeStats,
        imputation: &ImputationStats,
    ) -> Self {
        let sanitized = measurement_columns()
            .filter_map(|col| sanitize.replaced.get(col).map(|n| (col.to_string(), *n)))
            .collect();

        Self {
            file_name: file_name.into(),
            rows: cleaned.height(),
            missing_before,
            missing_after: count_missing(cleaned),
            sanitized,
            interpolated: imputation.interpolated.clone(),
            median_filled: imputation.median_filled.clone(),
        }
    }

    /// Remaining nulls across the six measurement columns.
    pub fn total_missing(&self) -> usize {
        measurement_columns()
            .filter_map(|col| self.missing_after.get(col))
            .sum()
    }

    /// True when no measurement column has a missing value left.
    pub fn is_complete(&self) -> bool {
        self.total_missing() == 0
    }
}

impl fmt::Display for MissingValueReport {
    /// File name, then one `column count` line per column in schema order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.file_name)?;
        for (col, _) in COLUMNS {
            if let Some(count) = self.missing_after.get(col) {
                writeln!(f, "{:<20} {}", col, count)?;
            }
        }
        Ok(())
    }
}

/// Code and message of a dataset that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub code: String,
    pub message: String,
}

impl From<&CleaningError> for FailureInfo {
    fn from(err: &CleaningError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result of one dataset within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetOutcome {
    Cleaned {
        report: MissingValueReport,
        /// Where the cleaned table was written, if a sink exported it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exported_to: Option<String>,
    },
    Failed {
        file_name: String,
        error: FailureInfo,
    },
    Cancelled {
        file_name: String,
    },
}

impl DatasetOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            Self::Cleaned { report, .. } => &report.file_name,
            Self::Failed { file_name, .. } | Self::Cancelled { file_name } => file_name,
        }
    }

    pub fn report(&self) -> Option<&MissingValueReport> {
        match self {
            Self::Cleaned { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The free-text diagnostic line for a failed dataset.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Failed { file_name, error } => {
                Some(format!("{}: {} [{}]", file_name, error.message, error.code))
            }
            _ => None,
        }
    }
}

/// Outcomes of every dataset in a batch, in batch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub datasets: Vec<DatasetOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(datasets: Vec<DatasetOutcome>) -> Self {
        let mut report = Self {
            generated_at: Local::now().to_rfc3339(),
            succeeded: 0,
            failed: 0,
            cancelled: 0,
            datasets,
        };
        for outcome in &report.datasets {
            match outcome {
                DatasetOutcome::Cleaned { .. } => report.succeeded += 1,
                DatasetOutcome::Failed { .. } => report.failed += 1,
                DatasetOutcome::Cancelled { .. } => report.cancelled += 1,
            }
        }
        report
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn outcome(&self, file_name: &str) -> Option<&DatasetOutcome> {
        self.datasets.iter().find(|o| o.file_name() == file_name)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON to `path`.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_json_pretty()?.as_bytes())?;
        info!("Report saved: {}", path.display());
        Ok(())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.datasets {
            match outcome {
                DatasetOutcome::Cleaned { report, exported_to } => {
                    write!(f, "{}", report)?;
                    if let Some(path) = exported_to {
                        writeln!(f, "written to {}", path)?;
                    }
                    writeln!(f)?;
                }
                DatasetOutcome::Failed { .. } => {
                    if let Some(line) = outcome.diagnostic() {
                        writeln!(f, "FAILED {}", line)?;
                        writeln!(f)?;
                    }
                }
                DatasetOutcome::Cancelled { file_name } => {
                    writeln!(f, "CANCELLED {}", file_name)?;
                    writeln!(f)?;
                }
            }
        }
        write!(
            f,
            "{} cleaned, {} failed, {} cancelled",
            self.succeeded, self.failed, self.cancelled
        )
    }
}
