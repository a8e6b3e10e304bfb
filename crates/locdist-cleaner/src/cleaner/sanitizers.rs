//! Value-level sanitization of numeric columns.

use polars::prelude::*;

/// Replace non-finite values (±inf, NaN) with null.
///
/// Returns the new series and how many values were replaced.
pub(crate) fn null_non_finite(series: &Series) -> PolarsResult<(Series, usize)> {
    replace_with_null(series, |v| !v.is_finite())
}

/// Replace non-finite and non-positive values with null.
pub(crate) fn null_non_positive(series: &Series) -> PolarsResult<(Series, usize)> {
    replace_with_null(series, |v| !v.is_finite() || v <= 0.0)
}

fn replace_with_null<F>(series: &Series, is_invalid: F) -> PolarsResult<(Series, usize)>
where
    F: Fn(f64) -> bool,
{
    let values = series.f64()?;
    let mut replacement_count = 0;

    let cleaned: Vec<Option<f64>> = values
        .into_iter()
        .map(|opt| match opt {
            Some(v) if is_invalid(v) => {
                replacement_count += 1;
                None
            }
            other => other,
        })
        .collect();

    Ok((Series::new(series.name().clone(), cleaned), replacement_count))
}
