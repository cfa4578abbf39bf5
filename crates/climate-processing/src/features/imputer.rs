//! Statistical imputation of missing numeric values.

use crate::error::Result;
use crate::utils::{float_series, is_numeric_dtype, mean, median, most_frequent, numeric_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Summary statistic used to fill missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Use the mean of non-null values
    #[default]
    Mean,
    /// Use the median of non-null values
    Median,
    /// Use the most frequent non-null value
    MostFrequent,
}

impl ImputeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::Median => "median",
            ImputeStrategy::MostFrequent => "most_frequent",
        }
    }

    fn fill_value(&self, present: &[f64]) -> Option<f64> {
        match self {
            ImputeStrategy::Mean => mean(present),
            ImputeStrategy::Median => median(present),
            ImputeStrategy::MostFrequent => most_frequent(present),
        }
    }
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImputeStrategy {
    type Err = crate::error::ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "most_frequent" | "mode" => Ok(ImputeStrategy::MostFrequent),
            other => Err(crate::error::ProcessingError::invalid_parameter(
                "strategy",
                format!("unknown imputation strategy '{other}' (expected mean, median or most_frequent)"),
            )),
        }
    }
}

/// Fill nulls in every numeric column using `strategy`.
///
/// Non-numeric columns are untouched. Columns without nulls keep their
/// original dtype; imputed columns become `Float64`. A numeric column with
/// no non-null values has nothing to summarise and is dropped, so no numeric
/// column of the result has missing values. The row count never changes.
pub fn impute(df: &DataFrame, strategy: ImputeStrategy) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        if !is_numeric_dtype(column.dtype()) || column.null_count() == 0 {
            columns.push(column.clone());
            continue;
        }

        let name = column.name().to_string();
        let values = numeric_values(column.as_materialized_series())?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();

        let Some(fill) = strategy.fill_value(&present) else {
            warn!("Column '{}' has no values to impute from; dropped", name);
            continue;
        };

        let filled: Vec<Option<f64>> = values.into_iter().map(|v| Some(v.unwrap_or(fill))).collect();
        columns.push(float_series(&name, filled).into_column());

        debug!("Filled '{}' with {}: {:.2}", name, strategy, fill);
    }

    Ok(DataFrame::new_with_height(df.height(), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(df: &DataFrame, col: &str, idx: usize) -> f64 {
        df.column(col)
            .unwrap()
            .get(idx)
            .unwrap()
            .try_extract::<f64>()
            .unwrap()
    }

    #[test]
    fn test_impute_mean() {
        let df = df!["rain" => [Some(1.0), None, Some(5.0)]].unwrap();

        let out = impute(&df, ImputeStrategy::Mean).unwrap();
        assert_eq!(out.column("rain").unwrap().null_count(), 0);
        assert_eq!(value(&out, "rain", 1), 3.0);
        // Input frame is untouched.
        assert_eq!(df.column("rain").unwrap().null_count(), 1);
    }

    #[test]
    fn test_impute_median() {
        let df = df!["rain" => [Some(1.0), None, Some(3.0), None, Some(10.0)]].unwrap();

        let out = impute(&df, ImputeStrategy::Median).unwrap();
        assert_eq!(value(&out, "rain", 1), 3.0);
        assert_eq!(value(&out, "rain", 3), 3.0);
        assert_eq!(value(&out, "rain", 4), 10.0);
    }

    #[test]
    fn test_impute_most_frequent_on_integers() {
        let df = df!["year" => [Some(2000i64), Some(2001), Some(2001), None]].unwrap();

        let out = impute(&df, ImputeStrategy::MostFrequent).unwrap();
        assert_eq!(value(&out, "year", 3), 2001.0);
    }

    #[test]
    fn test_impute_leaves_strings_untouched() {
        let df = df![
            "region" => [Some("north"), None],
            "temp" => [Some(1.0), None],
        ]
        .unwrap();

        let out = impute(&df, ImputeStrategy::Mean).unwrap();
        assert_eq!(out.column("region").unwrap().null_count(), 1);
        assert_eq!(out.column("temp").unwrap().null_count(), 0);
    }

    #[test]
    fn test_impute_no_missing_is_noop() {
        let df = df!["temp" => [1i32, 2, 3]].unwrap();

        let out = impute(&df, ImputeStrategy::Median).unwrap();
        assert!(out.equals(&df));
        assert_eq!(out.column("temp").unwrap().dtype(), &DataType::Int32);
    }

    #[test]
    fn test_impute_all_null_column_is_dropped() {
        let df = df![
            "temp" => [Some(1.0), None],
            "empty" => [Option::<f64>::None, None],
        ]
        .unwrap();

        let out = impute(&df, ImputeStrategy::Mean).unwrap();
        let names: Vec<String> = out.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["temp"]);
        assert_eq!(out.height(), 2);
        let remaining: usize = out
            .get_columns()
            .iter()
            .filter(|c| is_numeric_dtype(c.dtype()))
            .map(|c| c.null_count())
            .sum();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_impute_only_all_null_columns_keeps_rows() {
        let df = df!["empty" => [Option::<f64>::None, None, None]].unwrap();

        let out = impute(&df, ImputeStrategy::Median).unwrap();
        assert_eq!(out.width(), 0);
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("mean".parse::<ImputeStrategy>().unwrap(), ImputeStrategy::Mean);
        assert_eq!(
            "most-frequent".parse::<ImputeStrategy>().unwrap(),
            ImputeStrategy::MostFrequent
        );
        assert!("knn".parse::<ImputeStrategy>().is_err());
    }
}
