//! Feature engineering operations.
//!
//! Every operation takes a `&DataFrame` and returns a new frame; the input
//! is never modified. Unchanged columns are shared with the input.
//!
//! - Statistical imputation (mean, median, most frequent)
//! - One-hot encoding of categorical columns
//! - Interaction terms, equal-width binning, log/sqrt transformations
//!
//! A sequence of operations can be described with [`FeatureStep`] and run
//! with [`apply_steps`].

mod derived;
mod encoder;
mod imputer;

pub use derived::{BIN_RANGE, Transformation, bin, interaction, transform};
pub use encoder::encode_categorical;
pub use imputer::{ImputeStrategy, impute};

use crate::error::{ProcessingError, Result, ResultExt};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// One user-selected feature engineering operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FeatureStep {
    Impute { strategy: ImputeStrategy },
    Encode,
    Interaction { left: String, right: String },
    Bin { column: String, bins: usize },
    Transform { column: String, kind: Transformation },
}

impl FeatureStep {
    /// Apply this step to `df`.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            FeatureStep::Impute { strategy } => impute(df, *strategy),
            FeatureStep::Encode => encode_categorical(df),
            FeatureStep::Interaction { left, right } => interaction(df, left, right),
            FeatureStep::Bin { column, bins } => bin(df, column, *bins),
            FeatureStep::Transform { column, kind } => transform(df, column, *kind),
        }
    }

    /// Short description used in logs and error context.
    pub fn describe(&self) -> String {
        match self {
            FeatureStep::Impute { strategy } => format!("impute ({strategy})"),
            FeatureStep::Encode => "encode categorical columns".to_string(),
            FeatureStep::Interaction { left, right } => format!("interaction {left} x {right}"),
            FeatureStep::Bin { column, bins } => format!("bin {column} into {bins}"),
            FeatureStep::Transform { column, kind } => format!("{kind} transform of {column}"),
        }
    }
}

/// Parses the compact command-line forms:
/// `impute:mean`, `encode`, `interact:a,b`, `bin:col:5`, `transform:col:log`.
impl FromStr for FeatureStep {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        let (op, rest) = s.split_once(':').unwrap_or((s, ""));
        let invalid = || {
            ProcessingError::invalid_parameter("step", format!("cannot parse feature step '{s}'"))
        };

        match op.trim().to_ascii_lowercase().as_str() {
            "impute" => Ok(FeatureStep::Impute {
                strategy: if rest.is_empty() {
                    ImputeStrategy::default()
                } else {
                    rest.parse()?
                },
            }),
            "encode" => Ok(FeatureStep::Encode),
            "interact" | "interaction" => {
                let (left, right) = rest.split_once(',').ok_or_else(invalid)?;
                Ok(FeatureStep::Interaction {
                    left: left.trim().to_string(),
                    right: right.trim().to_string(),
                })
            }
            "bin" => {
                let (column, bins) = rest.rsplit_once(':').ok_or_else(invalid)?;
                let bins = bins.trim().parse::<usize>().map_err(|_| invalid())?;
                Ok(FeatureStep::Bin {
                    column: column.to_string(),
                    bins,
                })
            }
            "transform" => {
                let (column, kind) = rest.rsplit_once(':').ok_or_else(invalid)?;
                Ok(FeatureStep::Transform {
                    column: column.to_string(),
                    kind: kind.parse()?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// Apply `steps` in order, returning the final frame.
///
/// Stops at the first failing step; the error names the step.
pub fn apply_steps(df: &DataFrame, steps: &[FeatureStep]) -> Result<DataFrame> {
    let mut current = df.clone();
    for (i, step) in steps.iter().enumerate() {
        info!("Feature step {}/{}: {}", i + 1, steps.len(), step.describe());
        current = step
            .apply(&current)
            .context(format!("Feature step '{}' failed", step.describe()))?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_steps() {
        assert_eq!(
            "impute:median".parse::<FeatureStep>().unwrap(),
            FeatureStep::Impute {
                strategy: ImputeStrategy::Median
            }
        );
        assert_eq!("encode".parse::<FeatureStep>().unwrap(), FeatureStep::Encode);
        assert_eq!(
            "interact:temp,humidity".parse::<FeatureStep>().unwrap(),
            FeatureStep::Interaction {
                left: "temp".to_string(),
                right: "humidity".to_string()
            }
        );
        assert_eq!(
            "bin:rain:4".parse::<FeatureStep>().unwrap(),
            FeatureStep::Bin {
                column: "rain".to_string(),
                bins: 4
            }
        );
        assert_eq!(
            "transform:co2:sqrt".parse::<FeatureStep>().unwrap(),
            FeatureStep::Transform {
                column: "co2".to_string(),
                kind: Transformation::Sqrt
            }
        );
        assert!("bin:rain".parse::<FeatureStep>().is_err());
        assert!("scale".parse::<FeatureStep>().is_err());
    }

    #[test]
    fn test_step_json_shape() {
        let step = FeatureStep::Bin {
            column: "rain".to_string(),
            bins: 3,
        };
        let json = serde_json::to_string(&step).unwrap();
        assert_eq!(json, r#"{"op":"bin","column":"rain","bins":3}"#);
    }

    #[test]
    fn test_apply_steps_in_order() {
        let df = df![
            "temp" => [Some(1.0), None, Some(3.0)],
            "humidity" => [2.0, 2.0, 2.0],
            "region" => ["a", "b", "a"],
        ]
        .unwrap();

        let steps = vec![
            FeatureStep::Impute {
                strategy: ImputeStrategy::Mean,
            },
            FeatureStep::Interaction {
                left: "temp".to_string(),
                right: "humidity".to_string(),
            },
            FeatureStep::Encode,
        ];

        let out = apply_steps(&df, &steps).unwrap();
        let product: Vec<Option<f64>> = out
            .column("temp_x_humidity")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(product, vec![Some(2.0), Some(4.0), Some(6.0)]);
        assert!(out.column("region_b").is_ok());
        assert!(out.column("region").is_err());
    }

    #[test]
    fn test_apply_steps_reports_failing_step() {
        let df = df!["temp" => [-1.0, 4.0]].unwrap();
        let steps = vec![FeatureStep::Transform {
            column: "temp".to_string(),
            kind: Transformation::Sqrt,
        }];

        let err = apply_steps(&df, &steps).unwrap_err();
        assert_eq!(err.error_code(), "DOMAIN_ERROR");
        assert!(err.to_string().contains("sqrt transform of temp"));
    }
}
