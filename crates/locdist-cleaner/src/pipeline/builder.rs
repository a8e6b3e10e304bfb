//! The cleaning pipeline and its builder.

use crate::cleaner::Sanitizer;
use crate::config::{CleaningConfig, ConfigValidationError};
use crate::error::{CleaningError, Result, ResultExt};
use crate::imputers::{ImputationStats, Imputer};
use crate::loader::DatasetLoader;
use crate::pipeline::executor;
use crate::pipeline::progress::{
    CancellationToken, CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::reporting::{count_missing, BatchReport, MissingValueReport};
use crate::sink::{CsvExportSink, DatasetSink};
use crate::temporal::TemporalNormalizer;
use crate::types::{CleanedDataset, RawDataset};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Runs Loader, Sanitizer, Temporal Normalizer and Imputer over one dataset
/// or a whole batch.
///
/// Use [`CleaningPipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use locdist_cleaner::{CleaningConfig, CleaningPipeline};
///
/// let config = CleaningConfig::builder().base_dir("/data/exports").build()?;
/// let report = CleaningPipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {} {}", update.progress * 100.0, update.dataset, update.message);
///     })
///     .build()?
///     .run_batch();
///
/// println!("{}", report);
/// ```
pub struct CleaningPipeline {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
    sink: Option<Arc<dyn DatasetSink>>,
    imputer: Imputer,
}

// Batches may run on a rayon pool, which shares the pipeline by reference.
static_assertions::assert_impl_all!(CleaningPipeline: Send, Sync);

impl CleaningPipeline {
    pub fn builder() -> CleaningPipelineBuilder {
        CleaningPipelineBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Clean every dataset named by the configuration.
    ///
    /// Never fails as a whole: each dataset's failure is recorded in its
    /// outcome and the batch moves on to the next file.
    pub fn run_batch(&self) -> BatchReport {
        self.run_paths(&self.config.dataset_paths())
    }

    /// Clean the given files as one batch, outcomes in the order given.
    pub fn run_paths(&self, paths: &[PathBuf]) -> BatchReport {
        let start_time = Instant::now();
        info!(
            "Cleaning {} datasets ({})",
            paths.len(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );

        let outcomes = if self.config.parallel {
            executor::run_parallel(self, paths)
        } else {
            executor::run_sequential(self, paths)
        };
        let report = BatchReport::from_outcomes(outcomes);

        info!(
            "Batch finished in {:.2}s: {} cleaned, {} failed, {} cancelled",
            start_time.elapsed().as_secs_f64(),
            report.succeeded,
            report.failed,
            report.cancelled
        );
        report
    }

    /// Load and clean one file.
    ///
    /// The configured sink is not involved; see [`CleaningPipeline::run_paths`]
    /// for a run that stores its results.
    ///
    /// # Errors
    ///
    /// Returns `Err(CleaningError::Cancelled)` if cancellation was requested
    /// before or between stages; otherwise the first stage error.
    pub fn clean_file(&self, path: &Path) -> Result<CleanedDataset> {
        let name = dataset_name(path);
        let result = self.load_and_clean(&name, path);
        self.finish(&name, result)
    }

    /// Clean a dataset already in memory.
    pub fn clean_dataset(&self, raw: RawDataset) -> Result<CleanedDataset> {
        let name = raw.name().to_string();
        let result = self.check_cancelled().and_then(|_| self.clean_internal(raw));
        self.finish(&name, result)
    }

    /// Load and clean one file, then hand it to the sink. The dataset only
    /// reports [`CleaningStage::Complete`] once the sink has accepted it.
    pub(crate) fn clean_and_store(
        &self,
        path: &Path,
    ) -> Result<(CleanedDataset, Option<PathBuf>)> {
        let name = dataset_name(path);
        let result = self.load_and_clean(&name, path).and_then(|dataset| {
            let location = match &self.sink {
                Some(sink) => sink
                    .consume(&dataset)
                    .context(format!("Failed to store '{}'", name))?,
                None => None,
            };
            Ok((dataset, location))
        });
        self.finish(&name, result)
    }

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    fn load_and_clean(&self, name: &str, path: &Path) -> Result<CleanedDataset> {
        self.check_cancelled()?;
        self.report_progress(ProgressUpdate::new(
            name,
            CleaningStage::Loading,
            0.0,
            "Loading dataset...",
        ));
        let raw = DatasetLoader.load(path)?;
        self.clean_internal(raw)
    }

    /// Emit the terminal progress update for `name`.
    fn finish<T>(&self, name: &str, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.report_progress(ProgressUpdate::complete(name, "Dataset cleaned"));
                Ok(value)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled(name));
                } else {
                    self.report_progress(ProgressUpdate::failed(name, e.to_string()));
                    error!("Failed to clean '{}': {}", name, e);
                }
                Err(e)
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(CleaningError::Cancelled);
        }
        Ok(())
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn clean_internal(&self, raw: RawDataset) -> Result<CleanedDataset> {
        let start_time = Instant::now();
        let name = raw.name().to_string();
        info!("Cleaning '{}' ({} rows)", name, raw.height());

        // Step 1: Sanitize
        self.check_cancelled()?;
        self.report_progress(ProgressUpdate::new(
            &name,
            CleaningStage::Sanitizing,
            0.0,
            "Recoding invalid values...",
        ));
        let (raw, sanitize_stats) = Sanitizer.sanitize(raw)?;
        let missing_before = count_missing(raw.frame());

        // Step 2: Parse timestamps
        self.check_cancelled()?;
        self.report_progress(ProgressUpdate::new(
            &name,
            CleaningStage::TemporalNormalization,
            0.0,
            "Parsing dates and timestamps...",
        ));
        let normalized = TemporalNormalizer.normalize(raw)?;

        // Step 3: Interpolate
        self.check_cancelled()?;
        self.report_progress(ProgressUpdate::new(
            &name,
            CleaningStage::Interpolation,
            0.0,
            "Interpolating position and motion...",
        ));
        let mut imputation = ImputationStats::default();
        let normalized = self.imputer.interpolate(normalized, &mut imputation)?;

        // Step 4: Median fill
        self.check_cancelled()?;
        self.report_progress(ProgressUpdate::new(
            &name,
            CleaningStage::MedianImputation,
            0.0,
            "Filling accuracy and altitude...",
        ));
        let normalized = self.imputer.fill_medians(normalized, &mut imputation)?;

        // Step 5: Report
        self.report_progress(ProgressUpdate::new(
            &name,
            CleaningStage::Reporting,
            0.0,
            "Counting remaining missing values...",
        ));
        let frame = normalized.frame().clone();
        let report =
            MissingValueReport::build(&name, missing_before, &frame, &sanitize_stats, &imputation);

        info!(
            "Cleaned '{}' in {:.2}s: {} values still missing",
            name,
            start_time.elapsed().as_secs_f64(),
            report.total_missing()
        );

        Ok(CleanedDataset {
            name,
            frame,
            report,
        })
    }
}

pub(crate) fn dataset_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Builder for [`CleaningPipeline`].
#[derive(Default)]
pub struct CleaningPipelineBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
    sink: Option<Arc<dyn DatasetSink>>,
}

static_assertions::assert_impl_all!(CleaningPipelineBuilder: Send);

impl CleaningPipelineBuilder {
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a custom progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// With parallel cleaning the closure is called from several threads.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the batch.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Hand every cleaned dataset to `sink`.
    ///
    /// Takes precedence over the configuration's `export_dir`.
    pub fn sink(mut self, sink: Arc<dyn DatasetSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> std::result::Result<CleaningPipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let sink = self.sink.or_else(|| {
            config
                .export_dir()
                .map(|dir| Arc::new(CsvExportSink::new(dir)) as Arc<dyn DatasetSink>)
        });

        Ok(CleaningPipeline {
            imputer: Imputer::new(config.group_by_user),
            config,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
            sink,
        })
    }
}
