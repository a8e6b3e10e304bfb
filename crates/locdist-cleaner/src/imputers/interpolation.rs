//! Order-dependent interpolation.
//!
//! The table is sorted once by `app_raw_timestamp` (or by `user` then
//! `app_raw_timestamp` when grouping), then each interpolated column is
//! filled along that order:
//! - interior gaps linearly between the nearest present neighbours, in index
//!   order rather than elapsed time
//! - leading gaps with the first present value
//! - trailing gaps with the last present value
//!
//! A column (or user run) with no present value is left as it is.

use crate::error::{CleaningError, Result};
use crate::schema::{INTERPOLATED_COLUMNS, TIMESTAMP, USER};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, warn};

/// Fill interior gaps linearly. Returns the number of values filled.
pub fn interpolate_linear(values: &mut [Option<f64>]) -> usize {
    let mut filled = 0;
    let mut prev: Option<(usize, f64)> = None;

    for idx in 0..values.len() {
        let Some(current) = values[idx] else {
            continue;
        };
        if let Some((start, start_val)) = prev {
            let span = (idx - start) as f64;
            for gap in start + 1..idx {
                let t = (gap - start) as f64 / span;
                values[gap] = Some(start_val + (current - start_val) * t);
                filled += 1;
            }
        }
        prev = Some((idx, current));
    }

    filled
}

/// Extend the first and last present values over leading and trailing gaps.
/// Returns the number of values filled.
pub fn fill_edges(values: &mut [Option<f64>]) -> usize {
    let Some(first) = values.iter().position(Option::is_some) else {
        return 0;
    };
    // Safe: a present value exists, so `rposition` finds one too.
    let last = values.iter().rposition(Option::is_some).unwrap_or(first);

    let first_val = values[first];
    let last_val = values[last];
    values[..first].fill(first_val);
    values[last + 1..].fill(last_val);

    first + (values.len() - last - 1)
}

/// Interior interpolation followed by edge propagation.
pub fn fill_sequence(values: &mut [Option<f64>]) -> usize {
    interpolate_linear(values) + fill_edges(values)
}

/// Sorts a frame by time and interpolates the motion/position columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceInterpolator {
    group_by_user: bool,
}

impl SequenceInterpolator {
    pub fn new(group_by_user: bool) -> Self {
        Self { group_by_user }
    }

    /// Sort `df` and fill the interpolated columns.
    ///
    /// Returns the sorted, filled frame and the number of values filled per
    /// column.
    pub fn apply(
        &self,
        df: DataFrame,
        processing_steps: &mut Vec<String>,
    ) -> Result<(DataFrame, BTreeMap<String, usize>)> {
        let mut required = vec![TIMESTAMP];
        required.extend(INTERPOLATED_COLUMNS);
        if self.group_by_user {
            required.push(USER);
        }
        require_columns(&df, &required)?;

        let mut df = self.sort(&df)?;
        let segments = self.segments(&df)?;

        if !self.group_by_user && df.column(USER).is_ok() {
            let users = distinct_users(&df)?;
            if users > 1 {
                warn!(
                    "Interpolating across {} interleaved user streams; \
                     enable per-user grouping to keep streams apart",
                    users
                );
            }
        }

        let mut filled_counts = BTreeMap::new();
        for col_name in INTERPOLATED_COLUMNS {
            let series = df.column(col_name)?.as_materialized_series();
            let mut values: Vec<Option<f64>> = series.f64()?.into_iter().collect();

            let mut filled = 0;
            let mut empty_segments = 0;
            for range in &segments {
                let segment = &mut values[range.clone()];
                if segment.iter().all(Option::is_none) {
                    empty_segments += 1;
                    continue;
                }
                filled += fill_sequence(segment);
            }

            if empty_segments > 0 {
                warn!(
                    "'{}' has {} sequence(s) with no present value; left missing",
                    col_name, empty_segments
                );
            }
            debug!("Interpolated {} values in '{}'", filled, col_name);

            df.replace(col_name, Series::new(col_name.into(), values))?;
            processing_steps.push(format!(
                "Interpolated '{}': {} values ({} sequences)",
                col_name,
                filled,
                segments.len()
            ));
            filled_counts.insert(col_name.to_string(), filled);
        }

        Ok((df, filled_counts))
    }

    fn sort(&self, df: &DataFrame) -> Result<DataFrame> {
        let keys: Vec<&str> = if self.group_by_user {
            vec![USER, TIMESTAMP]
        } else {
            vec![TIMESTAMP]
        };
        let options = SortMultipleOptions::default()
            .with_maintain_order(true)
            .with_nulls_last(true);
        Ok(df.sort(keys, options)?)
    }

    /// Row ranges filled independently: the whole frame, or one range per
    /// run of equal `user` values.
    fn segments(&self, df: &DataFrame) -> Result<Vec<Range<usize>>> {
        let height = df.height();
        if !self.group_by_user {
            return Ok(vec![0..height]);
        }

        let users = df.column(USER)?.as_materialized_series().cast(&DataType::Int64)?;
        let users: Vec<Option<i64>> = users.i64()?.into_iter().collect();

        let mut segments = Vec::new();
        let mut start = 0;
        for idx in 1..=height {
            if idx == height || users[idx] != users[start] {
                segments.push(start..idx);
                start = idx;
            }
        }
        Ok(segments)
    }
}

/// Number of distinct non-null `user` values.
fn distinct_users(df: &DataFrame) -> Result<usize> {
    Ok(df
        .column(USER)?
        .as_materialized_series()
        .drop_nulls()
        .n_unique()?)
}

pub(crate) fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(CleaningError::ImputerPrecondition {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}
