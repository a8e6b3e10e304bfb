//! Median imputation for the order-independent columns.

use super::interpolation::require_columns;
use crate::error::Result;
use polars::prelude::*;
use tracing::{debug, warn};

/// Statistical imputation for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill the nulls of `col_name` with the median of its present values.
    ///
    /// An even count averages the two middle values. A column with no present
    /// value is left unchanged. Returns the median used (if any) and the
    /// number of values filled.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<(Option<f64>, usize)> {
        require_columns(df, &[col_name])?;

        let series = df
            .column(col_name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;

        let Some(median_val) = series.median() else {
            warn!("'{}' has no present value; median fill skipped", col_name);
            processing_steps.push(format!("Skipped median fill of '{}': no values", col_name));
            return Ok((None, 0));
        };

        let filled = Self::fill_with_value(df, col_name, median_val, &series, processing_steps)?;
        Ok((Some(median_val), filled))
    }

    /// Fill numeric column with a specific value.
    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        series: &Series,
        processing_steps: &mut Vec<String>,
    ) -> Result<usize> {
        let null_count = series.null_count();
        let filled: Float64Chunked = series
            .f64()?
            .into_iter()
            .map(|opt| Some(opt.unwrap_or(fill_value)))
            .collect();

        df.replace(col_name, filled.with_name(col_name.into()).into_series())?;

        debug!("Filled {} nulls in '{}' with median {:.4}", null_count, col_name, fill_value);
        processing_steps.push(format!(
            "Filled '{}' with median: {:.4} ({} values)",
            col_name, fill_value, null_count
        ));

        Ok(null_count)
    }
}
