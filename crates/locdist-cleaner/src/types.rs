//! Dataset types passed between pipeline stages.
//!
//! A dataset moves through two typing phases. [`RawDataset`] holds the
//! numeric columns already typed but both timestamp columns still as text.
//! Only the temporal normalizer can turn it into a [`NormalizedDataset`],
//! where `date_time` is a `Date` and `app_raw_timestamp` a `Datetime`. The
//! imputer consumes the normalized form and the pipeline wraps the result in
//! a [`CleanedDataset`] together with its missing-value report.

use crate::error::{CleaningError, Result};
use crate::reporting::MissingValueReport;
use crate::schema::COLUMNS;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Dataset straight out of the loader, timestamps unparsed.
#[derive(Debug, Clone)]
pub struct RawDataset {
    name: String,
    frame: DataFrame,
    // Non-finite values the loader already nulled in integer columns.
    loader_recoded: BTreeMap<String, usize>,
}

impl RawDataset {
    /// Wrap a frame, checking that every schema column is present.
    pub fn from_frame(name: impl Into<String>, frame: DataFrame) -> Result<Self> {
        let name = name.into();
        let missing = missing_columns(&frame);
        if !missing.is_empty() {
            return Err(CleaningError::SchemaMismatch {
                file: PathBuf::from(&name),
                missing,
            });
        }
        Ok(Self {
            name,
            frame,
            loader_recoded: BTreeMap::new(),
        })
    }

    pub(crate) fn with_loader_recoded(mut self, counts: BTreeMap<String, usize>) -> Self {
        self.loader_recoded = counts;
        self
    }

    /// Per-column count of `inf`/`nan` values the loader turned into nulls
    /// because the column holds integers. The sanitizer reports them.
    pub fn loader_recoded(&self) -> &BTreeMap<String, usize> {
        &self.loader_recoded
    }

    /// File name the dataset was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Split into name and frame for a stage that rebuilds the dataset.
    pub fn into_parts(self) -> (String, DataFrame) {
        (self.name, self.frame)
    }
}

/// Dataset whose temporal columns have been parsed.
#[derive(Debug, Clone)]
pub struct NormalizedDataset {
    name: String,
    frame: DataFrame,
}

impl NormalizedDataset {
    /// Only the temporal normalizer produces this type.
    pub(crate) fn new(name: String, frame: DataFrame) -> Self {
        Self { name, frame }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub(crate) fn into_parts(self) -> (String, DataFrame) {
        (self.name, self.frame)
    }
}

/// Final handoff: the cleaned table plus its report.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub name: String,
    pub frame: DataFrame,
    pub report: MissingValueReport,
}

/// Schema columns absent from `frame`, in schema order.
pub(crate) fn missing_columns(frame: &DataFrame) -> Vec<String> {
    let present: Vec<&str> = frame
        .get_column_names()
        .into_iter()
        .map(|s| s.as_str())
        .collect();
    COLUMNS
        .iter()
        .filter(|(name, _)| !present.contains(name))
        .map(|(name, _)| name.to_string())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    #[test]
    fn test_from_frame_accepts_full_schema() {
        let frame = fixtures::raw_frame(
            &["2021-05-01T10:00:00Z"],
            &[Some(48.8)],
            &[Some(5.0)],
        );
        let dataset = RawDataset::from_frame("a.csv", frame).unwrap();
        assert_eq!(dataset.name(), "a.csv");
        assert_eq!(dataset.height(), 1);
    }

    #[test]
    fn test_from_frame_reports_missing_columns() {
        let frame = fixtures::raw_frame(
            &["2021-05-01T10:00:00Z"],
            &[Some(48.8)],
            &[Some(5.0)],
        )
        .drop_many([SPEED, ALTITUDE]);

        let err = RawDataset::from_frame("a.csv", frame).unwrap_err();
        match err {
            CleaningError::SchemaMismatch { missing, .. } => {
                assert_eq!(missing, vec![ALTITUDE.to_string(), SPEED.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
