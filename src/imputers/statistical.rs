//! Statistical imputation methods.
//!
//! Fills missing numeric values with a central-tendency statistic, either
//! globally or per stratum of a categorical column, and missing categorical
//! values with a constant label. All fills are idempotent: a column with no
//! remaining nulls passes through untouched.

use crate::error::{AnalysisError, Result};
use crate::utils::{
    fill_numeric_nulls, fill_string_nulls, mean, median, optional_numeric_values,
    optional_string_values,
};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Central-tendency statistic used as the fill value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralTendency {
    /// sum / count over non-missing values.
    Mean,
    /// Middle order statistic; average of the two middle values for even
    /// counts.
    Median,
}

impl CentralTendency {
    fn compute(self, values: &[f64]) -> Option<f64> {
        match self {
            CentralTendency::Mean => mean(values),
            CentralTendency::Median => median(values),
        }
    }

    fn label(self) -> &'static str {
        match self {
            CentralTendency::Mean => "mean",
            CentralTendency::Median => "median",
        }
    }
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill missing values of a numeric column with its global mean.
    pub fn impute_mean(
        df: &mut DataFrame,
        column: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        Self::impute_global(df, column, CentralTendency::Mean, processing_steps)
    }

    /// Fill missing values of a numeric column with its global median.
    pub fn impute_median(
        df: &mut DataFrame,
        column: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        Self::impute_global(df, column, CentralTendency::Median, processing_steps)
    }

    /// Fill missing values of `target` with the stratum-local mean, where a
    /// stratum is the set of rows sharing one `group` value. A stratum with
    /// no non-missing target values (and rows whose group is itself
    /// missing) falls back to the global mean.
    pub fn impute_mean_by_group(
        df: &mut DataFrame,
        target: &str,
        group: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        Self::impute_by_group(df, target, group, CentralTendency::Mean, processing_steps)
    }

    /// Stratified median counterpart of [`impute_mean_by_group`](Self::impute_mean_by_group).
    pub fn impute_median_by_group(
        df: &mut DataFrame,
        target: &str,
        group: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        Self::impute_by_group(df, target, group, CentralTendency::Median, processing_steps)
    }

    /// Fill missing values of a categorical column with a constant label.
    pub fn fill_constant_label(
        df: &mut DataFrame,
        column: &str,
        label: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = Self::series(df, column)?;
        let null_count = series.null_count();
        if null_count == 0 {
            debug!("'{}' has no missing values, skipping constant fill", column);
            return Ok(());
        }

        let filled = fill_string_nulls(series, label)?;
        df.replace(column, filled)?;
        processing_steps.push(format!(
            "Filled {null_count} missing '{column}' values with constant label '{label}'"
        ));
        Ok(())
    }

    fn impute_global(
        df: &mut DataFrame,
        column: &str,
        how: CentralTendency,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = Self::series(df, column)?;
        let null_count = series.null_count();
        if null_count == 0 {
            debug!("'{}' has no missing values, skipping imputation", column);
            return Ok(());
        }

        let non_missing: Vec<f64> = optional_numeric_values(series)?
            .into_iter()
            .flatten()
            .collect();
        let fill = how
            .compute(&non_missing)
            .ok_or_else(|| AnalysisError::NoValidValues(column.to_string()))?;

        let filled = fill_numeric_nulls(series, fill)?;
        df.replace(column, filled)?;

        processing_steps.push(format!(
            "Filled {} missing '{}' values with {}: {:.2}",
            null_count,
            column,
            how.label(),
            fill
        ));
        Ok(())
    }

    fn impute_by_group(
        df: &mut DataFrame,
        target: &str,
        group: &str,
        how: CentralTendency,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let target_series = Self::series(df, target)?;
        let null_count = target_series.null_count();
        if null_count == 0 {
            debug!("'{}' has no missing values, skipping imputation", target);
            return Ok(());
        }

        let values = optional_numeric_values(target_series)?;
        let groups = optional_string_values(Self::series(df, group)?)?;

        let non_missing: Vec<f64> = values.iter().flatten().copied().collect();
        let global = how
            .compute(&non_missing)
            .ok_or_else(|| AnalysisError::NoValidValues(target.to_string()))?;

        let mut strata: HashMap<&str, Vec<f64>> = HashMap::new();
        for (g, v) in groups.iter().zip(values.iter()) {
            if let (Some(g), Some(v)) = (g, v) {
                strata.entry(g.as_str()).or_default().push(*v);
            }
        }
        let stratum_fill: HashMap<&str, f64> = strata
            .iter()
            .filter_map(|(key, vals)| how.compute(vals).map(|m| (*key, m)))
            .collect();

        let mut fallback_count = 0usize;
        let filled: Vec<f64> = values
            .iter()
            .zip(groups.iter())
            .map(|(v, g)| match v {
                Some(v) => *v,
                None => match g.as_deref().and_then(|g| stratum_fill.get(g)) {
                    Some(local) => *local,
                    None => {
                        fallback_count += 1;
                        global
                    }
                },
            })
            .collect();

        df.replace(target, Series::new(target.into(), filled))?;

        processing_steps.push(format!(
            "Filled {} missing '{}' values with {} per '{}' stratum ({} fell back to the global {} {:.2})",
            null_count,
            target,
            how.label(),
            group,
            fallback_count,
            how.label(),
            global
        ));
        Ok(())
    }

    fn series<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Series> {
        Ok(df
            .column(column)
            .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?
            .as_materialized_series())
    }
}
