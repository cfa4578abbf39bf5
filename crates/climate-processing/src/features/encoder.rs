//! One-hot encoding of categorical columns.

use crate::error::Result;
use crate::utils::{is_categorical_dtype, string_values};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

/// One-hot encode every string/categorical column.
///
/// Each categorical column is replaced, in place, by one boolean indicator
/// per category except the first in sorted order (dropped to avoid
/// collinearity). Indicators are named `{column}_{category}`; a null row is
/// false in every indicator. Numeric and boolean columns pass through. The
/// row count is kept even when every column encodes to nothing.
pub fn encode_categorical(df: &DataFrame) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        if !is_categorical_dtype(column.dtype()) {
            columns.push(column.clone());
            continue;
        }

        let name = column.name().to_string();
        let values = string_values(column.as_materialized_series())?;
        let categories: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();

        for category in categories.iter().skip(1) {
            let indicator: Vec<bool> = values
                .iter()
                .map(|v| v.as_deref() == Some(*category))
                .collect();
            columns.push(
                Series::new(format!("{name}_{category}").into(), indicator).into_column(),
            );
        }

        debug!(
            "Encoded '{}' into {} indicator column(s)",
            name,
            categories.len().saturating_sub(1)
        );
    }

    Ok(DataFrame::new_with_height(df.height(), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_drops_first_category() {
        let df = df![
            "region" => ["south", "north", "east", "north"],
            "temp" => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();

        let out = encode_categorical(&df).unwrap();

        let names: Vec<String> = out.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["region_north", "region_south", "temp"]);
        assert_eq!(out.height(), 4);

        let north = out.column("region_north").unwrap();
        assert_eq!(north.dtype(), &DataType::Boolean);
        let north: Vec<Option<bool>> = north.bool().unwrap().into_iter().collect();
        assert_eq!(north, vec![Some(false), Some(true), Some(false), Some(true)]);
    }

    #[test]
    fn test_encode_nulls_are_all_false() {
        let df = df!["season" => [Some("dry"), None, Some("wet")]].unwrap();

        let out = encode_categorical(&df).unwrap();
        let wet: Vec<Option<bool>> = out
            .column("season_wet")
            .unwrap()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(wet, vec![Some(false), Some(false), Some(true)]);
    }

    #[test]
    fn test_encode_single_category_disappears() {
        let df = df![
            "country" => ["nepal", "nepal"],
            "temp" => [1.0, 2.0],
        ]
        .unwrap();

        let out = encode_categorical(&df).unwrap();
        assert_eq!(out.width(), 1);
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_encode_only_single_category_columns_keeps_rows() {
        let df = df![
            "country" => ["nepal", "nepal", "nepal"],
            "basin" => ["koshi", "koshi", "koshi"],
        ]
        .unwrap();

        let out = encode_categorical(&df).unwrap();
        assert_eq!(out.width(), 0);
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn test_encode_without_categoricals_is_identity() {
        let df = df![
            "year" => [2000i64, 2001],
            "coastal" => [true, false],
        ]
        .unwrap();

        let out = encode_categorical(&df).unwrap();
        assert!(out.equals(&df));
    }
}
