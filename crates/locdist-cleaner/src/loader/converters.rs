//! Text-to-typed conversions for freshly loaded columns.
//!
//! The loader reads every column as text and converts the numeric ones here.
//! Unlike a lenient cast, a value that is neither empty, a missing-data
//! marker, nor a number is an error: it means the file does not follow the
//! schema.

use crate::error::{CleaningError, Result};
use polars::prelude::*;

/// Markers the exporting tool writes for an absent value.
pub(crate) const NA_MARKERS: [&str; 8] = ["", "na", "n/a", "null", "none", "<na>", "#n/a", "nat"];

/// Check if a string is a missing-data marker.
pub(crate) fn is_na_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    NA_MARKERS.iter().any(|&marker| lower == marker)
}

/// Parse a float field. `inf`, `-inf`, `infinity` and `nan` are accepted as
/// numbers; cleaning them is the sanitizer's job.
pub(crate) fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Parse an integer field, accepting integral float text such as `"3.0"`.
pub(crate) fn parse_integer(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(v as i64),
        _ => None,
    }
}

/// Convert a text column to `Float64`.
pub(crate) fn text_to_float(series: &Series) -> Result<Series> {
    convert(series, |s| parse_float(s).map(Some))
}

/// Convert a text column to `Int64`.
///
/// An `Int64` column cannot hold `inf` or `nan`, so those values become null
/// here instead of in the sanitizer. The returned count says how many.
pub(crate) fn text_to_integer(series: &Series) -> Result<(Series, usize)> {
    let mut non_finite = 0;
    let converted = convert(series, |s| match parse_float(s) {
        Some(v) if !v.is_finite() => {
            non_finite += 1;
            Some(None)
        }
        _ => parse_integer(s).map(Some),
    })?;
    Ok((converted, non_finite))
}

/// Replace missing-data markers in a text column with nulls, leaving other
/// values untouched.
pub(crate) fn nullify_na_markers(series: &Series) -> Result<Series> {
    let str_series = series.str()?;
    let cleaned: Vec<Option<&str>> = str_series
        .into_iter()
        .map(|opt| opt.filter(|v| !is_na_marker(v)))
        .collect();
    Ok(Series::new(series.name().clone(), cleaned))
}

/// `parse` returns `None` for invalid text and `Some(None)` for a value
/// that is valid but stored as null.
fn convert<T, F>(series: &Series, mut parse: F) -> Result<Series>
where
    F: FnMut(&str) -> Option<Option<T>>,
    Series: NamedFrom<Vec<Option<T>>, [Option<T>]>,
{
    let str_series = series.str()?;
    let mut result_vec: Vec<Option<T>> = Vec::with_capacity(str_series.len());

    for (row, opt_val) in str_series.into_iter().enumerate() {
        match opt_val {
            Some(val) if is_na_marker(val) => result_vec.push(None),
            Some(val) => match parse(val) {
                Some(parsed) => result_vec.push(parsed),
                None => {
                    return Err(CleaningError::InvalidNumeric {
                        column: series.name().to_string(),
                        row,
                        value: val.to_string(),
                    });
                }
            },
            None => result_vec.push(None),
        }
    }

    Ok(Series::new(series.name().clone(), result_vec))
}
