//! Sanitization of raw numeric values.
//!
//! Runs before the temporal normalizer and before any filling:
//! - every ±inf or NaN in a float column becomes null
//! - every value <= 0 in latitude, longitude, speed and distance becomes null
//!
//! Integer columns cannot hold ±inf or NaN, so the loader nulls those and the
//! counts it recorded are reported here alongside the float recodes.
//!
//! The stage is idempotent: a sanitized dataset passes through unchanged.

mod sanitizers;

use crate::error::Result;
use crate::schema::POSITIVE_COLUMNS;
use crate::types::RawDataset;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Replacement counts produced by one sanitizer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeStats {
    /// Values turned into nulls, per column. Columns with no replacement are
    /// omitted.
    pub replaced: BTreeMap<String, usize>,
}

impl SanitizeStats {
    pub fn total(&self) -> usize {
        self.replaced.values().sum()
    }
}

/// Recodes infinite and domain-invalid values as missing.
pub struct Sanitizer;

impl Sanitizer {
    /// Sanitize every float column of the dataset.
    pub fn sanitize(&self, dataset: RawDataset) -> Result<(RawDataset, SanitizeStats)> {
        let mut stats = SanitizeStats {
            replaced: dataset.loader_recoded().clone(),
        };
        let (name, mut df) = dataset.into_parts();

        info!("Sanitizing numeric columns...");

        let float_columns: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| matches!(col.dtype(), DataType::Float64 | DataType::Float32))
            .map(|col| col.name().to_string())
            .collect();

        for col_name in &float_columns {
            let series = df
                .column(col_name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;

            let (cleaned, count) = if POSITIVE_COLUMNS.contains(&col_name.as_str()) {
                sanitizers::null_non_positive(&series)?
            } else {
                sanitizers::null_non_finite(&series)?
            };

            if count > 0 {
                debug!("Recoded {} invalid values in '{}' as missing", count, col_name);
                df.replace(col_name, cleaned)?;
                stats.replaced.insert(col_name.clone(), count);
            }
        }

        info!("Sanitization complete: {} values recoded", stats.total());
        Ok((RawDataset::from_frame(name, df)?, stats))
    }
}
