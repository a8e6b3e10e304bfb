//! Progress reporting and cancellation for a cleaning run.
//!
//! Progress is reported per dataset: every [`ProgressUpdate`] names the file
//! it belongs to, so a reporter shared by parallel runs can tell them apart.
//!
//! # Example
//!
//! ```rust,ignore
//! use locdist_cleaner::{CleaningPipeline, CancellationToken};
//!
//! let token = CancellationToken::new();
//! let token_clone = token.clone();
//! ctrlc_handler(move || token_clone.cancel());
//!
//! let report = CleaningPipeline::builder()
//!     .config(config)
//!     .cancellation_token(token)
//!     .on_progress(|update| {
//!         println!("[{}] {:?} {}", update.dataset, update.stage, update.message);
//!     })
//!     .build()?
//!     .run_batch();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages a single dataset passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Reading the CSV and typing its columns
    Loading,
    /// Recoding infinite and invalid values as missing
    Sanitizing,
    /// Parsing `date_time` and `app_raw_timestamp`
    TemporalNormalization,
    /// Sorting by time and interpolating position and motion
    Interpolation,
    /// Filling accuracy and altitude with medians
    MedianImputation,
    /// Counting what is left missing
    Reporting,
    Complete,
    Cancelled,
    Failed,
}

impl CleaningStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Sanitizing => "Sanitizing",
            Self::TemporalNormalization => "Normalizing Timestamps",
            Self::Interpolation => "Interpolating",
            Self::MedianImputation => "Median Imputation",
            Self::Reporting => "Reporting",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Share of a dataset's run spent in this stage. The working stages sum
    /// to 1.0; terminal states weigh nothing.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.30,
            Self::Sanitizing => 0.10,
            Self::TemporalNormalization => 0.15,
            Self::Interpolation => 0.30,
            Self::MedianImputation => 0.10,
            Self::Reporting => 0.05,
            Self::Complete | Self::Cancelled | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Sanitizing => 0.30,
            Self::TemporalNormalization => 0.40,
            Self::Interpolation => 0.55,
            Self::MedianImputation => 0.85,
            Self::Reporting => 0.95,
            Self::Complete => 1.0,
            Self::Cancelled | Self::Failed => 0.0,
        }
    }
}

/// One progress event for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// File name of the dataset being cleaned
    pub dataset: String,

    pub stage: CleaningStage,

    /// Progress of this dataset (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(
        dataset: impl Into<String>,
        stage: CleaningStage,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            dataset: dataset.into(),
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    pub fn complete(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            stage: CleaningStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn cancelled(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            stage: CleaningStage::Cancelled,
            progress: 0.0,
            stage_progress: 0.0,
            message: "Cleaning cancelled".to_string(),
        }
    }

    pub fn failed(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            stage: CleaningStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates while datasets are cleaned.
///
/// Must be `Send + Sync`: with parallel cleaning enabled, updates arrive from
/// several worker threads at once.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Token for cancelling a running batch.
///
/// Clones share one flag. The pipeline checks it between stages; the dataset
/// in flight ends with [`CleaningError::Cancelled`](crate::error::CleaningError::Cancelled)
/// and datasets not yet started are marked cancelled.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Callable from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_cancellation_token_clone_shares_state() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();
        assert!(!token2.is_cancelled());

        token1.cancel();
        assert!(token2.is_cancelled());

        token2.reset();
        assert!(!token1.is_cancelled());
    }

    #[test]
    fn test_progress_update_scales_by_stage() {
        let update = ProgressUpdate::new("a.csv", CleaningStage::Interpolation, 0.5, "Interpolating");
        assert_eq!(update.dataset, "a.csv");
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.70).abs() < 1e-6);
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            CleaningStage::Loading,
            CleaningStage::Sanitizing,
            CleaningStage::TemporalNormalization,
            CleaningStage::Interpolation,
            CleaningStage::MedianImputation,
            CleaningStage::Reporting,
        ];

        let total_weight: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");

        // Each stage starts where the previous one ends.
        for pair in stages.windows(2) {
            let end = pair[0].base_progress() + pair[0].weight();
            assert!((end - pair[1].base_progress()).abs() < 1e-6, "{:?}", pair[1]);
        }
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new("a.csv", CleaningStage::Loading, 0.0, "Test"));
        reporter.report(ProgressUpdate::complete("a.csv", "Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(
            CleaningStage::TemporalNormalization.display_name(),
            "Normalizing Timestamps"
        );
        assert_eq!(CleaningStage::MedianImputation.display_name(), "Median Imputation");
        assert_eq!(CleaningStage::Failed.display_name(), "Failed");
    }

    #[test]
    fn test_stage_json_values() {
        let stage_expectations = [
            (CleaningStage::Loading, "\"loading\""),
            (CleaningStage::TemporalNormalization, "\"temporal_normalization\""),
            (CleaningStage::MedianImputation, "\"median_imputation\""),
            (CleaningStage::Cancelled, "\"cancelled\""),
        ];

        for (stage, expected_json) in stage_expectations {
            let json = serde_json::to_string(&stage).expect("Should serialize");
            assert_eq!(json, expected_json);
        }
    }

    #[test]
    fn test_cancellation_across_threads() {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            token_clone.is_cancelled()
        });

        token.cancel();

        let was_cancelled = handle.join().expect("Thread should not panic");
        assert!(was_cancelled);
    }
}
