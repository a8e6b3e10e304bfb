//! Batch execution.
//!
//! Datasets share nothing, so the batch runs them one after another or, when
//! enabled, on the rayon pool. Either way every dataset ends in exactly one
//! [`DatasetOutcome`] and outcomes keep the input order.

use crate::pipeline::CleaningPipeline;
use crate::pipeline::builder::dataset_name;
use crate::reporting::{DatasetOutcome, FailureInfo};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::warn;

pub(crate) fn run_sequential(pipeline: &CleaningPipeline, paths: &[PathBuf]) -> Vec<DatasetOutcome> {
    paths.iter().map(|path| clean_one(pipeline, path)).collect()
}

pub(crate) fn run_parallel(pipeline: &CleaningPipeline, paths: &[PathBuf]) -> Vec<DatasetOutcome> {
    paths.par_iter().map(|path| clean_one(pipeline, path)).collect()
}

/// Clean one file and hand the result to the sink. Never panics or returns
/// an error: failures become [`DatasetOutcome::Failed`].
fn clean_one(pipeline: &CleaningPipeline, path: &Path) -> DatasetOutcome {
    let file_name = dataset_name(path);

    if pipeline.cancellation_token().is_cancelled() {
        warn!("Skipping '{}': cancelled", file_name);
        return DatasetOutcome::Cancelled { file_name };
    }

    match pipeline.clean_and_store(path) {
        Ok((dataset, location)) => DatasetOutcome::Cleaned {
            report: dataset.report,
            exported_to: location.map(|p| p.display().to_string()),
        },
        Err(e) if e.is_cancelled() => DatasetOutcome::Cancelled { file_name },
        Err(e) => DatasetOutcome::Failed {
            file_name,
            error: FailureInfo::from(&e),
        },
    }
}
