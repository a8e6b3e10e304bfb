//! Location-distance dataset cleaner
//!
//! Cleans exported location-tracking tables so downstream temporal and
//! spatial analysis can trust their values.
//!
//! # Overview
//!
//! Every dataset runs through four stages, in order:
//!
//! - **Loader**: reads one CSV and types its numeric columns strictly
//! - **Sanitizer**: recodes infinities, NaN and non-positive coordinates,
//!   speeds and distances as missing
//! - **Temporal Normalizer**: parses `date_time` (strict `YYYY-MM-DD`) and
//!   `app_raw_timestamp` (ISO-8601, normalized to UTC)
//! - **Imputer**: sorts by time, interpolates latitude, longitude, speed and
//!   distance, then fills accuracy and altitude with their medians
//!
//! A batch runs every configured file independently: a dataset that fails is
//! reported and the rest still produce their missing-value reports.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use locdist_cleaner::{CleaningConfig, CleaningPipeline};
//!
//! let config = CleaningConfig::builder()
//!     .base_dir("/data/exports")
//!     .build()?;
//!
//! let report = CleaningPipeline::builder()
//!     .config(config)
//!     .build()?
//!     .run_batch();
//!
//! for outcome in &report.datasets {
//!     match outcome.report() {
//!         Some(r) => println!("{}", r),
//!         None => eprintln!("{}", outcome.diagnostic().unwrap_or_default()),
//!     }
//! }
//! ```
//!
//! # Single datasets
//!
//! ```rust,ignore
//! let cleaned = pipeline.clean_file(Path::new("Locationdistance_eb2prod_1.csv"))?;
//! println!("{} rows, {} still missing", cleaned.frame.height(), cleaned.report.total_missing());
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod schema;
pub mod sink;
pub mod temporal;
pub mod types;

// Re-exports for convenient access
pub use cleaner::{SanitizeStats, Sanitizer};
pub use config::{CleaningConfig, CleaningConfigBuilder, ConfigValidationError};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use imputers::{ImputationStats, Imputer, SequenceInterpolator, StatisticalImputer};
pub use loader::DatasetLoader;
pub use pipeline::{
    CancellationToken, CleaningPipeline, CleaningPipelineBuilder, CleaningStage,
    ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
pub use reporting::{BatchReport, DatasetOutcome, FailureInfo, MissingValueReport};
pub use sink::{CollectingSink, CsvExportSink, DatasetSink};
pub use temporal::TemporalNormalizer;
pub use types::{CleanedDataset, NormalizedDataset, RawDataset};
