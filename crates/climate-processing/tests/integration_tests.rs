//! Integration tests for loading, feature engineering and preparation.
//!
//! These tests run the processing stages end to end on a small climate
//! fixture.

use climate_processing::features::{self, FeatureStep, ImputeStrategy, Transformation};
use climate_processing::preprocess::{self, StandardScaler};
use climate_processing::utils::{is_categorical_dtype, is_numeric_dtype};
use climate_processing::{DatasetCache, DatasetLoader, ErrorKind, ProcessingConfig, explore};
use polars::prelude::*;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn sample_path() -> PathBuf {
    fixtures_path().join("climate_sample.csv")
}

fn config() -> ProcessingConfig {
    ProcessingConfig::builder()
        .data_path(sample_path())
        .build()
        .unwrap()
}

fn load_sample() -> DataFrame {
    DatasetLoader::new(&config())
        .load(None)
        .expect("fixture should load")
}

fn engineered() -> DataFrame {
    let df = load_sample();
    let df = features::impute(&df, ImputeStrategy::Mean).unwrap();
    features::encode_categorical(&df).unwrap()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_fixture_from_default_path() {
    let df = load_sample();

    assert_eq!(df.height(), 24);
    assert_eq!(df.column("year").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("precipitation").unwrap().null_count(), 2);
}

#[test]
fn test_missing_dataset_is_not_found() {
    let loader = DatasetLoader::new(&config());
    let err = loader
        .load(Some(&fixtures_path().join("absent.csv")))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn test_cache_reuses_loaded_frame() {
    let mut cache = DatasetCache::new(DatasetLoader::new(&config()));

    let first = cache.get_or_load(None).unwrap();
    let second = cache.get_or_load(Some(&sample_path())).unwrap();

    assert_eq!(cache.len(), 1);
    assert!(first.equals_missing(&second));
}

// ============================================================================
// Feature Engineering
// ============================================================================

#[test]
fn test_impute_clears_missing_for_every_strategy() {
    let df = load_sample();

    for strategy in [
        ImputeStrategy::Mean,
        ImputeStrategy::Median,
        ImputeStrategy::MostFrequent,
    ] {
        let out = features::impute(&df, strategy).unwrap();
        for column in out.get_columns() {
            if is_numeric_dtype(column.dtype()) {
                assert_eq!(
                    column.null_count(),
                    0,
                    "{} left nulls in '{}'",
                    strategy,
                    column.name()
                );
            }
        }
    }
}

#[test]
fn test_encode_keeps_rows_and_removes_categoricals() {
    let df = load_sample();
    let out = features::encode_categorical(&df).unwrap();

    assert_eq!(out.height(), df.height());
    assert!(out.column("region").is_err());
    assert!(
        out.get_columns()
            .iter()
            .all(|c| !is_categorical_dtype(c.dtype()))
    );
    // Sorted categories: hill, mountain, terai; "hill" is dropped.
    assert!(out.column("region_mountain").is_ok());
    assert!(out.column("region_terai").is_ok());
    assert!(out.column("region_hill").is_err());
}

#[test]
fn test_feature_steps_pipeline() {
    let steps: Vec<FeatureStep> = [
        "impute:median",
        "interact:avg_min_temp,humidity",
        "bin:precipitation:4",
        "transform:precipitation:log",
        "encode",
    ]
    .iter()
    .map(|s| s.parse().unwrap())
    .collect();

    let out = features::apply_steps(&load_sample(), &steps).unwrap();

    assert!(out.column("avg_min_temp_x_humidity").is_ok());
    assert!(out.column("precipitation_log").is_ok());
    // The binned column is categorical, so encoding replaces it too.
    assert!(out.column("precipitation_binned").is_err());
    assert_eq!(out.height(), 24);
}

#[test]
fn test_transform_domain_error() {
    let df = df!["anomaly" => [0.5, -0.2, 1.0]].unwrap();

    let err = features::transform(&df, "anomaly", Transformation::Sqrt).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);
}

// ============================================================================
// Preparation
// ============================================================================

#[test]
fn test_prepare_is_deterministic() {
    let df = engineered();

    let a = preprocess::prepare_with_config(&df, &config()).unwrap();
    let b = preprocess::prepare_with_config(&df, &config()).unwrap();

    assert_eq!(a.split, b.split);
    assert!(a.x_train.equals(&b.x_train));
    assert_eq!(a.y_test, b.y_test);
    assert_eq!(a.split.test.len(), 5);
    assert_eq!(a.split.train.len(), 19);
}

#[test]
fn test_scaler_statistics_come_from_train_rows() {
    let df = engineered();
    let prepared = preprocess::prepare_with_config(&df, &config()).unwrap();

    let features = df.drop("avg_max_temp").unwrap();
    let (train, test) = prepared.split.apply(&features).unwrap();

    let refit = StandardScaler::fit(&train).unwrap();
    assert_eq!(refit, prepared.scaler);

    let test_only = StandardScaler::fit(&test).unwrap();
    assert_ne!(test_only.means(), prepared.scaler.means());
}

#[test]
fn test_prepare_missing_target_is_validation_error() {
    let df = engineered();
    let err = preprocess::prepare(&df, "wind_speed", 0.2, 42).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
}

// ============================================================================
// Exploration
// ============================================================================

#[test]
fn test_explore_fixture() {
    let df = load_sample();

    let stats = explore::basic_stats(&df).unwrap();
    assert!(stats.iter().any(|s| s.column == "humidity" && s.count == 23));

    let matrix = explore::correlation_matrix(&df).unwrap();
    let r = matrix.get("avg_max_temp", "avg_min_temp").unwrap();
    assert!(r > 0.9);

    let series = explore::time_series(&df, "year", "avg_max_temp").unwrap();
    assert_eq!(series.len(), 24);
    assert!(series.windows(2).all(|w| w[0].0 <= w[1].0));
}
