//! Loading a dataset file into memory.
//!
//! Every column is read as text first, then the numeric schema columns are
//! converted strictly (see [`converters`]). The two temporal columns stay
//! text: parsing them is the temporal normalizer's job.

mod converters;

use crate::error::{CleaningError, Result};
use crate::schema::{COLUMNS, ColumnKind};
use crate::types::RawDataset;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Reads one CSV file into a [`RawDataset`].
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load the file at `path`.
    ///
    /// Fails with a load error when the file is missing or unreadable, is not
    /// valid CSV, lacks a schema column, or holds a non-numeric value in a
    /// numeric column.
    pub fn load(&self, path: &Path) -> Result<RawDataset> {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("Loading dataset from: {}", path.display());

        let file = File::open(path).map_err(|e| CleaningError::Load {
            file: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| CleaningError::Load {
                file: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!("Read {} rows x {} columns", frame.height(), frame.width());

        let dataset = Self::type_columns(&name, frame).map_err(|e| match e {
            CleaningError::SchemaMismatch { missing, .. } => CleaningError::SchemaMismatch {
                file: path.to_path_buf(),
                missing,
            },
            other => other,
        })?;

        info!("Dataset loaded successfully: {:?}", dataset.frame().shape());
        Ok(dataset)
    }

    /// Check the header and convert the numeric columns of an all-text frame.
    pub fn type_columns(name: &str, frame: DataFrame) -> Result<RawDataset> {
        let (name, mut frame) = RawDataset::from_frame(name, frame)?.into_parts();

        let extra: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .filter(|col| !COLUMNS.iter().any(|(name, _)| *name == col.as_str()))
            .map(|col| col.to_string())
            .collect();
        if !extra.is_empty() {
            debug!("Carrying through extra columns: {:?}", extra);
        }

        let mut recoded = BTreeMap::new();
        for (col_name, kind) in COLUMNS {
            let series = frame.column(col_name)?.as_materialized_series().clone();
            // Already typed (e.g. built in memory rather than read from CSV).
            if kind != ColumnKind::Temporal && series.dtype() == &kind.raw_dtype() {
                continue;
            }
            let series = if series.dtype() == &DataType::String {
                series
            } else {
                series.cast(&DataType::String)?
            };
            let converted = match kind {
                ColumnKind::Temporal => converters::nullify_na_markers(&series)?,
                ColumnKind::Integer => {
                    let (converted, non_finite) = converters::text_to_integer(&series)?;
                    if non_finite > 0 {
                        debug!("Loaded {} non-finite values in '{}' as missing", non_finite, col_name);
                        recoded.insert(col_name.to_string(), non_finite);
                    }
                    converted
                }
                ColumnKind::Float => converters::text_to_float(&series)?,
            };
            frame.replace(col_name, converted)?;
        }

        Ok(RawDataset::from_frame(name, frame)?.with_loader_recoded(recoded))
    }
}
