//! Boolean mask builders for row selection.
//!
//! Every builder maps a missing value to `false`: a row whose predicate
//! cannot be evaluated is excluded from the selection, never included.
//! (Derived *columns* keep three-valued logic; see `features`.)

use crate::error::{AnalysisError, Result};
use crate::utils::{optional_numeric_values, optional_string_values};
use polars::prelude::*;
use regex::Regex;

fn series<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Series> {
    Ok(df
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?
        .as_materialized_series())
}

/// Rows where `column` equals `value` exactly.
pub fn eq_mask(df: &DataFrame, column: &str, value: &str) -> Result<BooleanChunked> {
    let values = optional_string_values(series(df, column)?)?;
    let mask: Vec<bool> = values
        .iter()
        .map(|v| v.as_deref() == Some(value))
        .collect();
    Ok(BooleanChunked::from_slice(column.into(), &mask))
}

/// Rows where `column >= threshold`.
pub fn ge_mask(df: &DataFrame, column: &str, threshold: f64) -> Result<BooleanChunked> {
    numeric_mask(df, column, |v| v >= threshold)
}

/// Rows where `column > threshold`.
pub fn gt_mask(df: &DataFrame, column: &str, threshold: f64) -> Result<BooleanChunked> {
    numeric_mask(df, column, |v| v > threshold)
}

/// Rows where `column < threshold`.
pub fn lt_mask(df: &DataFrame, column: &str, threshold: f64) -> Result<BooleanChunked> {
    numeric_mask(df, column, |v| v < threshold)
}

/// Rows whose text contains `token`, case-insensitively.
pub fn contains_mask(df: &DataFrame, column: &str, token: &str) -> Result<BooleanChunked> {
    let pattern = Regex::new(&format!("(?i){}", regex::escape(token)))
        .map_err(|e| AnalysisError::InvalidConfig(format!("bad token '{token}': {e}")))?;
    let values = optional_string_values(series(df, column)?)?;
    let mask: Vec<bool> = values
        .iter()
        .map(|v| v.as_deref().is_some_and(|s| pattern.is_match(s)))
        .collect();
    Ok(BooleanChunked::from_slice(column.into(), &mask))
}

fn numeric_mask<F>(df: &DataFrame, column: &str, predicate: F) -> Result<BooleanChunked>
where
    F: Fn(f64) -> bool,
{
    let values = optional_numeric_values(series(df, column)?)?;
    let mask: Vec<bool> = values.iter().map(|v| v.is_some_and(&predicate)).collect();
    Ok(BooleanChunked::from_slice(column.into(), &mask))
}
