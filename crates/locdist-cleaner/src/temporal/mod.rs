//! Temporal normalization.
//!
//! Parses `date_time` with the exact `YYYY-MM-DD` rule and
//! `app_raw_timestamp` as general ISO-8601. The first value that fails its
//! rule aborts the whole dataset with a
//! [`CleaningError::TemporalParse`]; nothing is skipped or guessed, because
//! the imputer orders rows by timestamp and a wrong timestamp would silently
//! corrupt that order. Empty fields stay null.
//!
//! Values without an offset are read as UTC, but a column may not mix them
//! with offset-carrying values: the first value whose kind differs from the
//! ones before it is reported as unparseable.
//!
//! `date_time` is not reconciled with `app_raw_timestamp`; around midnight
//! the two may name different days.

mod parsers;

pub use parsers::{parse_date_strict, parse_iso8601};

use chrono::NaiveDateTime;

use crate::error::{CleaningError, Result};
use crate::schema::{DATE_TIME, TIMESTAMP};
use crate::types::{NormalizedDataset, RawDataset};
use polars::prelude::*;
use tracing::{debug, info};

/// Unit of the normalized `app_raw_timestamp` column.
pub const TIMESTAMP_UNIT: TimeUnit = TimeUnit::Microseconds;

/// Turns a [`RawDataset`] into a [`NormalizedDataset`].
pub struct TemporalNormalizer;

impl TemporalNormalizer {
    /// Parse both temporal columns.
    pub fn normalize(&self, dataset: RawDataset) -> Result<NormalizedDataset> {
        let (name, mut df) = dataset.into_parts();

        info!("Normalizing temporal columns...");

        let dates = Self::parse_column(&df, DATE_TIME, parse_date_strict)?;
        let days: Vec<Option<i32>> = dates
            .iter()
            .map(|opt| opt.as_ref().and_then(parsers::to_epoch_days))
            .collect();
        let date_series = Series::new(DATE_TIME.into(), days).cast(&DataType::Date)?;
        df.replace(DATE_TIME, date_series)?;
        debug!("Parsed {} '{}' values", dates.len(), DATE_TIME);

        let timestamps = Self::parse_timestamps(&df)?;
        let micros: Vec<Option<i64>> = timestamps
            .iter()
            .map(|opt| opt.as_ref().map(parsers::to_epoch_micros))
            .collect();
        let ts_series = Series::new(TIMESTAMP.into(), micros)
            .cast(&DataType::Datetime(TIMESTAMP_UNIT, None))?;
        df.replace(TIMESTAMP, ts_series)?;
        debug!("Parsed {} '{}' values", timestamps.len(), TIMESTAMP);

        Ok(NormalizedDataset::new(name, df))
    }

    /// Parse every non-null value of a text column, failing on the first one
    /// the parser rejects.
    fn parse_column<T, F>(df: &DataFrame, column: &str, mut parse: F) -> Result<Vec<Option<T>>>
    where
        F: FnMut(&str) -> Option<T>,
    {
        let series = df.column(column)?.as_materialized_series();
        let text = series.str()?;

        text.into_iter()
            .map(|opt| match opt {
                Some(value) => parse(value).map(Some).ok_or_else(|| {
                    CleaningError::TemporalParse {
                        column: column.to_string(),
                        value: value.to_string(),
                    }
                }),
                None => Ok(None),
            })
            .collect()
    }

    /// Parse `app_raw_timestamp`, requiring every non-null value to agree on
    /// whether it carries an offset.
    fn parse_timestamps(df: &DataFrame) -> Result<Vec<Option<NaiveDateTime>>> {
        let mut zoned: Option<bool> = None;
        Self::parse_column(df, TIMESTAMP, |value| {
            let (utc, offset) = parsers::parse_iso8601_zoned(value)?;
            match zoned {
                Some(kind) if kind != offset.is_some() => None,
                _ => {
                    zoned = Some(offset.is_some());
                    Some(utc)
                }
            }
        })
    }
}
