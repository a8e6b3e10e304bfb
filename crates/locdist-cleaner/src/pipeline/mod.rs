//! Pipeline module.
//!
//! [`CleaningPipeline`] drives the stages over one dataset or a batch.

mod builder;
mod executor;
pub mod progress;

pub use builder::{CleaningPipeline, CleaningPipelineBuilder};
pub use progress::{
    CancellationToken, CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
