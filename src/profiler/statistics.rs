//! Statistical characteristics for column profiling.

use crate::error::Result;
use crate::utils::{mean, numeric_values, quantile_sorted, sample_std, string_mode};
use polars::prelude::*;
use std::collections::HashMap;

/// Extract statistical characteristics from a column.
pub(crate) fn extract_column_characteristics(
    series: &Series,
    inferred_type: &str,
) -> Result<HashMap<String, serde_json::Value>> {
    let mut characteristics = HashMap::new();

    if inferred_type == "numeric" {
        let values = numeric_values(series)?;
        if !values.is_empty() {
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            let mean_val = mean(&values).unwrap_or(0.0);
            let std = sample_std(&values).unwrap_or(0.0);
            let q1 = quantile_sorted(&sorted, 0.25);
            let median = quantile_sorted(&sorted, 0.5);
            let q3 = quantile_sorted(&sorted, 0.75);

            characteristics.insert("min".to_string(), serde_json::json!(sorted[0]));
            characteristics.insert(
                "max".to_string(),
                serde_json::json!(sorted[sorted.len() - 1]),
            );
            characteristics.insert("mean".to_string(), serde_json::json!(mean_val));
            characteristics.insert("std".to_string(), serde_json::json!(std));
            characteristics.insert("q1".to_string(), serde_json::json!(q1));
            characteristics.insert("median".to_string(), serde_json::json!(median));
            characteristics.insert("q3".to_string(), serde_json::json!(q3));
            characteristics.insert(
                "skewness".to_string(),
                serde_json::json!(skewness(&values, mean_val, std)),
            );
            characteristics.insert(
                "has_outliers".to_string(),
                serde_json::json!(has_iqr_outliers(&sorted, q1, q3)),
            );
        }
    } else if inferred_type == "categorical" || inferred_type == "string" {
        if let Some(most_frequent) = string_mode(series) {
            characteristics.insert(
                "most_frequent".to_string(),
                serde_json::json!(most_frequent),
            );
        }
    }

    Ok(characteristics)
}

/// Standardized third moment; zero when the spread is zero.
fn skewness(values: &[f64], mean: f64, std: f64) -> f64 {
    if std == 0.0 || values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    values
        .iter()
        .map(|v| ((v - mean) / std).powi(3))
        .sum::<f64>()
        / n
}

/// Whether any value falls outside the 1.5 * IQR fences.
fn has_iqr_outliers(sorted: &[f64], q1: f64, q3: f64) -> bool {
    if sorted.len() < 4 {
        return false;
    }
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    sorted.iter().any(|v| *v < lower || *v > upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_characteristics() {
        let series = Series::new("price".into(), &[10.0f64, 20.0, 30.0, 40.0, 50.0]);
        let chars = extract_column_characteristics(&series, "numeric").unwrap();

        assert!((chars["mean"].as_f64().unwrap() - 30.0).abs() < 1e-9);
        assert!((chars["median"].as_f64().unwrap() - 30.0).abs() < 1e-9);
        assert_eq!(chars["min"].as_f64().unwrap(), 10.0);
        assert_eq!(chars["max"].as_f64().unwrap(), 50.0);
        assert!(!chars["has_outliers"].as_bool().unwrap());
    }

    #[test]
    fn test_outlier_detection_flags_extreme_value() {
        let series = Series::new(
            "v".into(),
            &[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0],
        );
        let chars = extract_column_characteristics(&series, "numeric").unwrap();
        assert!(chars["has_outliers"].as_bool().unwrap());
    }

    #[test]
    fn test_skewness_direction() {
        let series = Series::new("v".into(), &[1.0f64, 1.0, 1.0, 1.0, 10.0]);
        let chars = extract_column_characteristics(&series, "numeric").unwrap();
        assert!(chars["skewness"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_categorical_characteristics() {
        let series = Series::new("cat".into(), &["a", "b", "a", "a"]);
        let chars = extract_column_characteristics(&series, "categorical").unwrap();
        assert_eq!(chars["most_frequent"].as_str().unwrap(), "a");
    }

    #[test]
    fn test_empty_numeric_has_no_stats() {
        let series: Series = Series::new("v".into(), Vec::<f64>::new());
        let chars = extract_column_characteristics(&series, "numeric").unwrap();
        assert!(chars.is_empty());
    }
}
