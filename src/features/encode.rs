//! Categorical encoding and text-derived flags.

use crate::error::{AnalysisError, Result};
use crate::utils::optional_string_values;
use polars::prelude::*;
use regex::Regex;
use tracing::debug;

/// One-hot encode a categorical column.
///
/// Each distinct observed category becomes a boolean column named
/// `<column>_<category>`; the source column is dropped. A row whose
/// category is missing gets `false` in every indicator column; missing is
/// not promoted to a category of its own.
pub fn one_hot(
    mut df: DataFrame,
    column: &str,
    processing_steps: &mut Vec<String>,
) -> Result<DataFrame> {
    let values = optional_string_values(
        df.column(column)
            .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?
            .as_materialized_series(),
    )?;

    let mut categories: Vec<String> = values.iter().flatten().cloned().collect();
    categories.sort();
    categories.dedup();

    for category in &categories {
        let indicator: Vec<bool> = values
            .iter()
            .map(|v| v.as_deref() == Some(category.as_str()))
            .collect();
        let name = format!("{column}_{category}");
        df.with_column(Series::new(name.into(), indicator))?;
    }

    let df = df.drop(column)?;
    debug!(
        "One-hot encoded '{}' into {} indicator columns",
        column,
        categories.len()
    );
    processing_steps.push(format!(
        "One-hot encoded '{}' into {} indicator columns",
        column,
        categories.len()
    ));
    Ok(df)
}

/// Add a nullable boolean column flagging rows whose text contains `token`,
/// case-insensitively.
///
/// Three-valued: a missing source value produces a missing flag, never
/// `false`. "Unknown" must not silently read as "no".
pub fn add_contains_flag(
    df: &mut DataFrame,
    source_column: &str,
    token: &str,
    output_column: &str,
    processing_steps: &mut Vec<String>,
) -> Result<()> {
    let pattern = Regex::new(&format!("(?i){}", regex::escape(token)))
        .map_err(|e| AnalysisError::InvalidConfig(format!("bad token '{token}': {e}")))?;

    let values = optional_string_values(
        df.column(source_column)
            .map_err(|_| AnalysisError::ColumnNotFound(source_column.to_string()))?
            .as_materialized_series(),
    )?;

    let flags: Vec<Option<bool>> = values
        .iter()
        .map(|v| v.as_deref().map(|s| pattern.is_match(s)))
        .collect();

    df.with_column(Series::new(output_column.into(), flags))?;
    processing_steps.push(format!(
        "Derived '{output_column}' by matching '{token}' against '{source_column}'"
    ));
    Ok(())
}
