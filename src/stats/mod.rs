//! Descriptive and inferential statistics over table columns.

use crate::error::{AnalysisError, Result};
use crate::utils::{mean, optional_numeric_values, optional_string_values, sample_std};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::HashMap;

/// Pearson correlation between two numeric columns.
///
/// Computed over pairwise-complete cases only: rows where either side is
/// missing are dropped. Zero variance on either side (or fewer than two
/// complete pairs) makes the statistic undefined and is an error, never a
/// silent 0.
pub fn pearson(df: &DataFrame, x: &str, y: &str) -> Result<f64> {
    let xs = optional_numeric_values(series(df, x)?)?;
    let ys = optional_numeric_values(series(df, y)?)?;

    let mut paired_x = Vec::new();
    let mut paired_y = Vec::new();
    for (a, b) in xs.into_iter().zip(ys) {
        if let (Some(a), Some(b)) = (a, b) {
            paired_x.push(a);
            paired_y.push(b);
        }
    }

    if paired_x.len() < 2 {
        return Err(AnalysisError::DegenerateStatistic {
            column: format!("{x}/{y}"),
            reason: format!("only {} complete pairs", paired_x.len()),
        });
    }

    let n = paired_x.len() as f64;
    let mean_x = paired_x.iter().sum::<f64>() / n;
    let mean_y = paired_y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in paired_x.iter().zip(paired_y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 {
        return Err(AnalysisError::DegenerateStatistic {
            column: x.to_string(),
            reason: "zero variance".to_string(),
        });
    }
    if var_y == 0.0 {
        return Err(AnalysisError::DegenerateStatistic {
            column: y.to_string(),
            reason: "zero variance".to_string(),
        });
    }

    Ok(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Two-sided confidence interval for a population mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Student-t confidence interval for the mean of a sample.
///
/// Standard error = sample standard deviation (n - 1 denominator) / sqrt(n);
/// the critical value comes from the t distribution with n - 1 degrees of
/// freedom.
pub fn mean_confidence_interval(values: &[f64], level: f64) -> Result<ConfidenceInterval> {
    if !(level > 0.0 && level < 1.0) {
        return Err(AnalysisError::InvalidConfig(format!(
            "confidence level must be strictly between 0 and 1, got {level}"
        )));
    }
    if values.len() < 2 {
        return Err(AnalysisError::DegenerateStatistic {
            column: "sample".to_string(),
            reason: format!(
                "confidence interval needs at least two values, got {}",
                values.len()
            ),
        });
    }

    let n = values.len() as f64;
    let sample_mean = mean(values).unwrap_or(0.0);
    let standard_error = sample_std(values).unwrap_or(0.0) / n.sqrt();

    let t = StudentsT::new(0.0, 1.0, n - 1.0).map_err(|e| AnalysisError::DegenerateStatistic {
        column: "sample".to_string(),
        reason: e.to_string(),
    })?;
    let critical = t.inverse_cdf(0.5 + level / 2.0);

    Ok(ConfidenceInterval {
        level,
        mean: sample_mean,
        lower: sample_mean - critical * standard_error,
        upper: sample_mean + critical * standard_error,
    })
}

/// Confidence interval for the mean of a numeric column, over its non-null
/// values.
pub fn column_confidence_interval(
    df: &DataFrame,
    column: &str,
    level: f64,
) -> Result<ConfidenceInterval> {
    let values: Vec<f64> = optional_numeric_values(series(df, column)?)?
        .into_iter()
        .flatten()
        .collect();
    if values.is_empty() {
        return Err(AnalysisError::NoValidValues(column.to_string()));
    }
    mean_confidence_interval(&values, level)
}

/// Cross-tabulation of two categorical columns.
///
/// Cell `counts[i][j]` is the number of rows with row label `i` and column
/// label `j`; rows with a missing side are skipped. This is the input for
/// independence testing. Reducing it to a normalized association
/// coefficient (Cramer's V and friends) is deliberately not implemented
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    pub row_column: String,
    pub col_column: String,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ContingencyTable {
    /// Total number of counted observations.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Count for a (row label, column label) pair.
    pub fn count(&self, row: &str, col: &str) -> Option<usize> {
        let i = self.row_labels.iter().position(|l| l == row)?;
        let j = self.col_labels.iter().position(|l| l == col)?;
        Some(self.counts[i][j])
    }
}

/// Build the cross-tabulation of two categorical columns, labels sorted
/// lexically for deterministic output.
pub fn contingency_table(df: &DataFrame, row: &str, col: &str) -> Result<ContingencyTable> {
    let row_values = optional_string_values(series(df, row)?)?;
    let col_values = optional_string_values(series(df, col)?)?;

    let mut pair_counts: HashMap<(String, String), usize> = HashMap::new();
    for (a, b) in row_values.into_iter().zip(col_values) {
        let (Some(a), Some(b)) = (a, b) else { continue };
        *pair_counts.entry((a, b)).or_insert(0) += 1;
    }

    let mut row_labels: Vec<String> = pair_counts.keys().map(|(a, _)| a.clone()).collect();
    row_labels.sort();
    row_labels.dedup();
    let mut col_labels: Vec<String> = pair_counts.keys().map(|(_, b)| b.clone()).collect();
    col_labels.sort();
    col_labels.dedup();

    let counts: Vec<Vec<usize>> = row_labels
        .iter()
        .map(|r| {
            col_labels
                .iter()
                .map(|c| {
                    pair_counts
                        .get(&(r.clone(), c.clone()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    Ok(ContingencyTable {
        row_column: row.to_string(),
        col_column: col.to_string(),
        row_labels,
        col_labels,
        counts,
    })
}

fn series<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Series> {
    Ok(df
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?
        .as_materialized_series())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ==================== pearson ====================

    #[test]
    fn test_pearson_perfect_positive() {
        let df = df![
            "X" => [1.0, 2.0, 3.0, 4.0],
            "Y" => [2.0, 4.0, 6.0, 8.0],
        ]
        .unwrap();
        let r = pearson(&df, "X", "Y").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_symmetry() {
        let df = df![
            "X" => [1.0, 2.0, 3.0, 5.0, 8.0],
            "Y" => [2.0, 1.0, 4.0, 4.0, 9.0],
        ]
        .unwrap();
        let xy = pearson(&df, "X", "Y").unwrap();
        let yx = pearson(&df, "Y", "X").unwrap();
        assert!((xy - yx).abs() < 1e-12);
        assert!((-1.0..=1.0).contains(&xy));
    }

    #[test]
    fn test_pearson_self_correlation_is_one() {
        let df = df!["X" => [1.0, 5.0, 3.0, 7.0]].unwrap();
        let r = pearson(&df, "X", "X").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_pairwise_deletion() {
        let df = df![
            "X" => [Some(1.0), Some(2.0), None, Some(4.0)],
            "Y" => [Some(1.0), None, Some(9.0), Some(4.0)],
        ]
        .unwrap();
        // complete pairs: (1,1) and (4,4)
        let r = pearson(&df, "X", "Y").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_zero_variance_is_an_error() {
        let df = df![
            "X" => [1.0, 1.0, 1.0],
            "Y" => [2.0, 3.0, 4.0],
        ]
        .unwrap();
        let err = pearson(&df, "X", "Y").unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_STATISTIC");
    }

    // ==================== confidence interval ====================

    #[test]
    fn test_confidence_interval_contains_mean() {
        let values = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0];
        let ci = mean_confidence_interval(&values, 0.95).unwrap();
        assert!(ci.lower < ci.mean && ci.mean < ci.upper);
    }

    #[test]
    fn test_confidence_interval_width_monotone_in_level() {
        let values = [10.0, 12.0, 9.0, 11.0, 13.0, 10.0, 12.0];
        let ci95 = mean_confidence_interval(&values, 0.95).unwrap();
        let ci99 = mean_confidence_interval(&values, 0.99).unwrap();
        assert!(ci99.width() > ci95.width());
        // the wider interval contains the narrower one
        assert!(ci99.lower < ci95.lower && ci95.upper < ci99.upper);
    }

    #[test]
    fn test_confidence_interval_known_value() {
        // n = 4, mean = 10, sample std = 2 -> se = 1; t(0.975, df=3) = 3.1824
        let values = [8.0, 9.0, 11.0, 12.0];
        let ci = mean_confidence_interval(&values, 0.95).unwrap();
        assert!((ci.mean - 10.0).abs() < 1e-12);
        let expected_half_width = 3.182446 * (10.0f64 / 3.0).sqrt() / 2.0;
        assert!((ci.upper - ci.mean - expected_half_width).abs() < 1e-3);
    }

    #[test]
    fn test_confidence_interval_single_value_is_an_error() {
        let err = mean_confidence_interval(&[5.0], 0.95).unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_STATISTIC");
    }

    #[test]
    fn test_confidence_interval_bad_level_rejected() {
        assert!(mean_confidence_interval(&[1.0, 2.0], 1.0).is_err());
        assert!(mean_confidence_interval(&[1.0, 2.0], 0.0).is_err());
    }

    // ==================== contingency table ====================

    #[test]
    fn test_contingency_table_counts() {
        let df = df![
            "ETHNICITY" => ["A", "A", "B", "B", "B"],
            "EDUCATION" => ["Degree", "None", "Degree", "Degree", "None"],
        ]
        .unwrap();

        let table = contingency_table(&df, "ETHNICITY", "EDUCATION").unwrap();

        assert_eq!(table.row_labels, vec!["A", "B"]);
        assert_eq!(table.col_labels, vec!["Degree", "None"]);
        assert_eq!(table.counts, vec![vec![1, 1], vec![2, 1]]);
        assert_eq!(table.total(), 5);
        assert_eq!(table.count("B", "Degree"), Some(2));
    }

    #[test]
    fn test_contingency_table_skips_missing_sides() {
        let df = df![
            "A" => [Some("x"), Some("x"), None],
            "B" => [Some("p"), None, Some("q")],
        ]
        .unwrap();

        let table = contingency_table(&df, "A", "B").unwrap();
        assert_eq!(table.total(), 1);
    }
}
