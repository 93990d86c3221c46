//! Row-wise derived columns.
//!
//! The derivations are pure functions over a single record, applied to the
//! table afterwards. This keeps the rules testable without any table
//! abstraction and independent of row iteration order.

use crate::error::{AnalysisError, Result};
use crate::utils::{optional_numeric_values, optional_string_values};
use polars::prelude::*;

/// Label assigned to every respondent with the manager flag set.
pub const MANAGEMENT_LABEL: &str = "Management";

/// Combined role label: the manager flag overrides seniority.
///
/// A missing seniority stays missing for non-managers; managers always get
/// [`MANAGEMENT_LABEL`].
pub fn role_label(is_manager: bool, seniority: Option<&str>) -> Option<String> {
    if is_manager {
        Some(MANAGEMENT_LABEL.to_string())
    } else {
        seniority.map(|s| s.to_string())
    }
}

/// Generation cohort by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    X,
    Y,
    Z,
    /// Catch-all for every age outside the three explicit brackets.
    Alpha,
}

impl Generation {
    pub fn label(self) -> &'static str {
        match self {
            Generation::X => "Generation X",
            Generation::Y => "Generation Y",
            Generation::Z => "Generation Z",
            Generation::Alpha => "Generation Alpha",
        }
    }
}

/// Bucket an age into its generation cohort.
///
/// Evaluated as an ordered chain, first match wins:
/// [39, 58] -> X, (29, 39) -> Y, (19, 29] -> Z, everything else -> Alpha.
/// The chain partitions the whole numeric domain; ages below 20 and above
/// 58 land in the catch-all.
pub fn generation_for_age(age: f64) -> Generation {
    if (39.0..=58.0).contains(&age) {
        Generation::X
    } else if age > 29.0 && age < 39.0 {
        Generation::Y
    } else if age > 19.0 && age <= 29.0 {
        Generation::Z
    } else {
        Generation::Alpha
    }
}

/// Add the combined role-label column derived from the manager flag and
/// seniority columns.
pub fn add_role_label(
    df: &mut DataFrame,
    manager_column: &str,
    seniority_column: &str,
    output_column: &str,
    processing_steps: &mut Vec<String>,
) -> Result<()> {
    let managers = optional_numeric_values(series(df, manager_column)?)?;
    let seniorities = optional_string_values(series(df, seniority_column)?)?;

    let labels: Vec<Option<String>> = managers
        .iter()
        .zip(seniorities.iter())
        .map(|(flag, seniority)| {
            let is_manager = flag.is_some_and(|v| v == 1.0);
            role_label(is_manager, seniority.as_deref())
        })
        .collect();

    df.with_column(Series::new(output_column.into(), labels))?;
    processing_steps.push(format!(
        "Derived '{output_column}' from '{manager_column}' and '{seniority_column}'"
    ));
    Ok(())
}

/// Add the generation-cohort column derived from an age column. Missing
/// ages produce missing cohorts.
pub fn add_generation(
    df: &mut DataFrame,
    age_column: &str,
    output_column: &str,
    processing_steps: &mut Vec<String>,
) -> Result<()> {
    let ages = optional_numeric_values(series(df, age_column)?)?;

    let labels: Vec<Option<&str>> = ages
        .iter()
        .map(|age| age.map(|a| generation_for_age(a).label()))
        .collect();

    df.with_column(Series::new(output_column.into(), labels))?;
    processing_steps.push(format!("Derived '{output_column}' from '{age_column}'"));
    Ok(())
}

fn series<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Series> {
    Ok(df
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?
        .as_materialized_series())
}
