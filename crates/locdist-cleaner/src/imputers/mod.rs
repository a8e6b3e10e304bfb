//! Imputation of the six measurement columns.
//!
//! Two steps, always in this order:
//! 1. [`SequenceInterpolator`] sorts the table by time and fills latitude,
//!    longitude, speed and distance along that order.
//! 2. [`StatisticalImputer`] fills accuracy and altitude with their column
//!    medians.
//!
//! The output keeps the sorted row order.

mod interpolation;
mod statistical;

pub use interpolation::{fill_edges, fill_sequence, interpolate_linear, SequenceInterpolator};
pub use statistical::StatisticalImputer;

use crate::error::Result;
use crate::schema::MEDIAN_COLUMNS;
use crate::types::NormalizedDataset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// What the imputer filled, per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationStats {
    pub interpolated: BTreeMap<String, usize>,
    pub median_filled: BTreeMap<String, usize>,
    /// Median used per column; absent when the column had no value.
    pub medians: BTreeMap<String, f64>,
    pub processing_steps: Vec<String>,
}

/// Runs both imputation steps on a normalized dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Imputer {
    group_by_user: bool,
}

impl Imputer {
    pub fn new(group_by_user: bool) -> Self {
        Self { group_by_user }
    }

    /// Interpolate, then median-fill.
    pub fn impute(&self, dataset: NormalizedDataset) -> Result<(NormalizedDataset, ImputationStats)> {
        let mut stats = ImputationStats::default();
        let dataset = self.interpolate(dataset, &mut stats)?;
        let dataset = self.fill_medians(dataset, &mut stats)?;
        Ok((dataset, stats))
    }

    /// Sort by time and fill the interpolated columns.
    pub fn interpolate(
        &self,
        dataset: NormalizedDataset,
        stats: &mut ImputationStats,
    ) -> Result<NormalizedDataset> {
        let (name, df) = dataset.into_parts();
        info!("Interpolating position and motion columns...");

        let (df, counts) = SequenceInterpolator::new(self.group_by_user)
            .apply(df, &mut stats.processing_steps)?;
        stats.interpolated.extend(counts);

        Ok(NormalizedDataset::new(name, df))
    }

    /// Fill accuracy and altitude with their medians.
    pub fn fill_medians(
        &self,
        dataset: NormalizedDataset,
        stats: &mut ImputationStats,
    ) -> Result<NormalizedDataset> {
        let (name, mut df) = dataset.into_parts();
        info!("Filling accuracy and altitude with medians...");

        for col_name in MEDIAN_COLUMNS {
            let (median, filled) = StatisticalImputer::apply_numeric_median(
                &mut df,
                col_name,
                &mut stats.processing_steps,
            )?;
            if let Some(median) = median {
                stats.medians.insert(col_name.to_string(), median);
            }
            stats.median_filled.insert(col_name.to_string(), filled);
        }

        Ok(NormalizedDataset::new(name, df))
    }
}
