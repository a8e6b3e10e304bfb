//! Integration tests for the cleaning pipeline.
//!
//! These run the whole pipeline over the CSV fixtures in `tests/fixtures/batch`.

use locdist_cleaner::schema::*;
use locdist_cleaner::{
    BatchReport, CancellationToken, CleanedDataset, CleaningConfig, CleaningPipeline,
    CleaningStage, CollectingSink, CsvExportSink, DatasetOutcome, ProgressUpdate,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn batch_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/batch")
}

fn config() -> CleaningConfig {
    CleaningConfig::builder()
        .base_dir(batch_dir())
        .build()
        .unwrap()
}

fn pipeline(config: CleaningConfig) -> CleaningPipeline {
    CleaningPipeline::builder().config(config).build().unwrap()
}

fn clean(index: usize, group_by_user: bool) -> CleanedDataset {
    let config = CleaningConfig::builder()
        .base_dir(batch_dir())
        .group_by_user(group_by_user)
        .build()
        .unwrap();
    let path = config.base_dir.join(config.file_name(index));
    pipeline(config).clean_file(&path).unwrap()
}

fn values(dataset: &CleanedDataset, column: &str) -> Vec<Option<f64>> {
    dataset
        .frame
        .column(column)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn assert_close(actual: &[Option<f64>], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        let a = a.expect("value should be present");
        assert!((a - e).abs() < 1e-9, "expected {e}, got {a}");
    }
}

// ============================================================================
// Batch Behaviour
// ============================================================================

#[test]
fn test_batch_isolation() {
    let report = pipeline(config()).run_batch();

    assert_eq!(report.datasets.len(), 7);
    assert_eq!(report.succeeded, 6);
    assert_eq!(report.failed, 1);
    assert_eq!(report.cancelled, 0);

    let failed = &report.datasets[2];
    assert_eq!(failed.file_name(), "Locationdistance_eb2prod_3.csv");
    match failed {
        DatasetOutcome::Failed { error, .. } => {
            assert_eq!(error.code, "TEMPORAL_PARSE_ERROR");
            assert!(error.message.contains("2021-13-01"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    for (i, outcome) in report.datasets.iter().enumerate() {
        assert_eq!(
            outcome.file_name(),
            format!("Locationdistance_eb2prod_{}.csv", i + 1)
        );
        if i != 2 {
            assert!(outcome.report().is_some(), "dataset {} has no report", i + 1);
        }
    }
}

#[test]
fn test_missing_file_does_not_stop_batch() {
    let config = CleaningConfig::builder()
        .base_dir(batch_dir())
        .dataset_count(8)
        .build()
        .unwrap();
    let report = pipeline(config).run_batch();

    assert_eq!(report.succeeded, 6);
    assert_eq!(report.failed, 2);
    match report.outcome("Locationdistance_eb2prod_8.csv").unwrap() {
        DatasetOutcome::Failed { error, .. } => assert_eq!(error.code, "LOAD_ERROR"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_non_finite_ids_load_as_missing() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/non_finite_ids.csv");
    let cleaned = pipeline(config()).clean_file(&path).unwrap();

    assert_eq!(cleaned.report.missing_before.get(USER), Some(&1));
    assert_eq!(cleaned.report.missing_before.get(SERVICE), Some(&1));
    assert_eq!(cleaned.report.missing_before.get(USER_UID), Some(&1));
    // Identifiers are never imputed.
    assert_eq!(cleaned.report.missing_after.get(USER), Some(&1));
    assert!(cleaned.report.is_complete());
}

#[test]
fn test_parallel_matches_sequential() {
    let sequential = pipeline(config()).run_batch();
    let parallel_config = CleaningConfig::builder()
        .base_dir(batch_dir())
        .parallel(true)
        .build()
        .unwrap();
    let parallel = pipeline(parallel_config).run_batch();

    assert_eq!(sequential.datasets, parallel.datasets);
}

#[test]
fn test_cancelled_batch_marks_every_dataset() {
    let token = CancellationToken::new();
    token.cancel();
    let report = CleaningPipeline::builder()
        .config(config())
        .cancellation_token(token)
        .build()
        .unwrap()
        .run_batch();

    assert_eq!(report.cancelled, 7);
    assert_eq!(report.succeeded, 0);
    assert!(!report.has_failures());
}

// ============================================================================
// Cleaning Results
// ============================================================================

#[test]
fn test_dataset_one_values() {
    let cleaned = clean(1, false);

    assert_eq!(cleaned.frame.height(), 5);
    assert_close(&values(&cleaned, LATITUDE), &[48.80, 48.81, 48.82, 48.83, 48.84]);
    assert_close(&values(&cleaned, LONGITUDE), &[2.34, 2.34, 2.36, 2.38, 2.40]);
    assert_close(
        &values(&cleaned, DISTANCE),
        &[10.0, 20.0, 20.0 + 10.0 / 3.0, 20.0 + 20.0 / 3.0, 30.0],
    );
    assert_close(&values(&cleaned, SPEED), &[0.5, 0.5, 1.5, 2.0, 2.5]);
    assert_close(&values(&cleaned, ACCURACY), &[4.0, 6.0, 8.0, 6.0, 6.0]);
    assert_close(&values(&cleaned, ALTITUDE), &[30.0, 40.0, 40.0, 50.0, 40.0]);

    let report = &cleaned.report;
    assert!(report.is_complete());
    for col in measurement_columns() {
        assert_eq!(report.missing_before.get(col), Some(&2), "{col}");
        assert_eq!(report.missing_after.get(col), Some(&0), "{col}");
    }
    assert_eq!(report.interpolated.get(LATITUDE), Some(&2));
    assert_eq!(report.median_filled.get(ALTITUDE), Some(&2));
}

#[test]
fn test_dataset_one_is_sorted_by_utc_timestamp() {
    let cleaned = clean(1, false);
    let ts = cleaned.frame.column(TIMESTAMP).unwrap();

    assert_eq!(ts.dtype(), &DataType::Datetime(TimeUnit::Microseconds, None));
    let micros: Vec<i64> = ts
        .as_materialized_series()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    // 10:00, 10:01 (space separated), 10:02, 10:03 (from +02:00), 10:04:00.5
    let minute = 60_000_000;
    let deltas: Vec<i64> = micros.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(deltas, vec![minute, minute, minute, minute + 500_000]);
    assert_eq!(
        cleaned.frame.column(DATE_TIME).unwrap().dtype(),
        &DataType::Date
    );
}

#[test]
fn test_leading_invalid_values_take_next_value() {
    let cleaned = clean(4, false);

    assert_close(&values(&cleaned, LATITUDE), &[34.60, 34.60, 34.61]);
    assert_close(&values(&cleaned, SPEED), &[0.4, 0.4, 0.5]);
    assert_eq!(cleaned.report.sanitized.get(LATITUDE), Some(&1));
}

#[test]
fn test_interpolation_crosses_users_without_grouping() {
    let cleaned = clean(5, false);
    assert_eq!(values(&cleaned, LATITUDE)[2], Some(65.0));
}

#[test]
fn test_interpolation_stays_within_user_when_grouped() {
    let cleaned = clean(5, true);

    let users: Vec<Option<i64>> = cleaned
        .frame
        .column(USER)
        .unwrap()
        .as_materialized_series()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(users, vec![Some(1), Some(1), Some(1), Some(2), Some(2)]);
    assert_close(
        &values(&cleaned, LATITUDE),
        &[10.0, 20.0, 30.0, 100.0, 300.0],
    );
}

#[test]
fn test_all_missing_columns_stay_missing() {
    let cleaned = clean(7, false);

    assert_eq!(cleaned.report.missing_after.get(LATITUDE), Some(&3));
    assert_eq!(cleaned.report.missing_after.get(LONGITUDE), Some(&3));
    assert_eq!(cleaned.report.missing_after.get(SPEED), Some(&0));
    assert_eq!(cleaned.report.total_missing(), 6);
    assert!(!cleaned.report.is_complete());
}

// ============================================================================
// Sinks, Progress and Output
// ============================================================================

#[test]
fn test_collecting_sink_receives_cleaned_datasets() {
    let sink = Arc::new(CollectingSink::new());
    let report = CleaningPipeline::builder()
        .config(config())
        .sink(sink.clone())
        .build()
        .unwrap()
        .run_batch();

    let collected = sink.take();
    assert_eq!(collected.len(), report.succeeded);
    assert!(collected.iter().all(|d| d.name != "Locationdistance_eb2prod_3.csv"));
}

#[test]
fn test_csv_export_writes_clean_files() {
    let out = std::env::temp_dir().join(format!("locdist-export-{}", std::process::id()));
    let config = CleaningConfig::builder()
        .base_dir(batch_dir())
        .dataset_count(2)
        .export_dir(&out)
        .build()
        .unwrap();
    let report = pipeline(config).run_batch();

    match &report.datasets[0] {
        DatasetOutcome::Cleaned { exported_to, .. } => {
            let path = PathBuf::from(exported_to.as_deref().unwrap());
            assert_eq!(path, CsvExportSink::new(&out).output_path("Locationdistance_eb2prod_1.csv"));
            let text = std::fs::read_to_string(&path).unwrap();
            assert_eq!(text.lines().count(), 6);
            assert!(text.lines().next().unwrap().contains(LATITUDE));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    std::fs::remove_dir_all(&out).ok();
}

#[test]
fn test_progress_names_each_dataset() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = updates.clone();
    let config = CleaningConfig::builder()
        .base_dir(batch_dir())
        .dataset_count(3)
        .build()
        .unwrap();
    CleaningPipeline::builder()
        .config(config)
        .on_progress(move |update| seen.lock().unwrap().push(update))
        .build()
        .unwrap()
        .run_batch();

    let updates = updates.lock().unwrap();
    let terminal: Vec<(String, CleaningStage)> = updates
        .iter()
        .filter(|u| matches!(u.stage, CleaningStage::Complete | CleaningStage::Failed))
        .map(|u| (u.dataset.clone(), u.stage))
        .collect();
    assert_eq!(
        terminal,
        vec![
            ("Locationdistance_eb2prod_1.csv".to_string(), CleaningStage::Complete),
            ("Locationdistance_eb2prod_2.csv".to_string(), CleaningStage::Complete),
            ("Locationdistance_eb2prod_3.csv".to_string(), CleaningStage::Failed),
        ]
    );
}

#[test]
fn test_json_report_round_trip() {
    let report = pipeline(config()).run_batch();
    let json = report.to_json_pretty().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["succeeded"], 6);
    assert_eq!(value["datasets"][2]["status"], "failed");
    assert_eq!(
        value["datasets"][0]["report"]["missing_after"][LATITUDE],
        0
    );

    let back: BatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}

#[test]
fn test_text_report_lists_files_and_failures() {
    let text = pipeline(config()).run_batch().to_string();

    assert!(text.contains("Locationdistance_eb2prod_1.csv\n"));
    assert!(text.contains("FAILED Locationdistance_eb2prod_3.csv: "));
    assert!(text.ends_with("6 cleaned, 1 failed, 0 cancelled"));
}
