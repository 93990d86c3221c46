//! Outlier detection and correction.
//!
//! A [`BoundRule`] classifies values as outliers; correction replaces the
//! offending values stratum by stratum with the stratum's own non-outlier
//! mean. The replacement is deliberately bracket-local: one global
//! replacement value would blur the scale differences the brackets encode.

use crate::config::BoundRule;
use crate::error::{AnalysisError, Result};
use crate::utils::{mean, optional_numeric_values, optional_string_values, population_std, quantile_sorted};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Stratum label for rows whose stratifying value is itself missing.
const MISSING_STRATUM: &str = "(missing)";

impl BoundRule {
    /// Compute the (lower, upper) outlier bounds for a set of values.
    pub fn bounds(&self, column: &str, values: &[f64]) -> Result<(f64, f64)> {
        if values.is_empty() {
            return Err(AnalysisError::DegenerateStatistic {
                column: column.to_string(),
                reason: "no values to compute outlier bounds from".to_string(),
            });
        }

        match *self {
            BoundRule::Sigma { k } => {
                let m = mean(values).unwrap_or(0.0);
                let std = population_std(values).unwrap_or(0.0);
                if std == 0.0 {
                    return Err(AnalysisError::DegenerateStatistic {
                        column: column.to_string(),
                        reason: "zero variance under the sigma rule".to_string(),
                    });
                }
                Ok((m - k * std, m + k * std))
            }
            BoundRule::Interquartile { factor } => {
                let mut sorted = values.to_vec();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let q1 = quantile_sorted(&sorted, 0.25);
                let q3 = quantile_sorted(&sorted, 0.75);
                let iqr = q3 - q1;
                Ok((q1 - factor * iqr, q3 + factor * iqr))
            }
        }
    }
}

/// Outcome of one outlier-correction pass.
#[derive(Debug, Clone)]
pub struct OutlierCorrection {
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Values replaced, per stratum.
    pub per_stratum: Vec<(String, usize)>,
}

impl OutlierCorrection {
    /// Total number of values replaced.
    pub fn corrected(&self) -> usize {
        self.per_stratum.iter().map(|(_, n)| n).sum()
    }
}

/// Detects and corrects outliers in numeric columns.
pub struct OutlierCorrector;

impl OutlierCorrector {
    /// Replace values of `target` that exceed the rule's upper bound
    /// (computed over the whole column) with the mean of the non-outlier
    /// values in the same `group` stratum.
    ///
    /// A stratum whose members are all outliers has no replacement value;
    /// that is a [`AnalysisError::DegenerateStratum`], never a silent
    /// global fallback.
    pub fn correct_upper_by_group(
        df: &mut DataFrame,
        target: &str,
        group: &str,
        rule: &BoundRule,
        processing_steps: &mut Vec<String>,
    ) -> Result<OutlierCorrection> {
        let target_series = df
            .column(target)
            .map_err(|_| AnalysisError::ColumnNotFound(target.to_string()))?
            .as_materialized_series();
        let values = optional_numeric_values(target_series)?;
        let groups = optional_string_values(
            df.column(group)
                .map_err(|_| AnalysisError::ColumnNotFound(group.to_string()))?
                .as_materialized_series(),
        )?;

        let non_missing: Vec<f64> = values.iter().flatten().copied().collect();
        let (lower_bound, upper_bound) = rule.bounds(target, &non_missing)?;
        debug!(
            "Outlier bounds for '{}': [{:.2}, {:.2}]",
            target, lower_bound, upper_bound
        );

        // Group values by stratum, splitting outliers from the rest.
        let mut keep: HashMap<&str, Vec<f64>> = HashMap::new();
        let mut exceed: HashMap<&str, usize> = HashMap::new();
        for (g, v) in groups.iter().zip(values.iter()) {
            let Some(v) = v else { continue };
            let stratum = g.as_deref().unwrap_or(MISSING_STRATUM);
            if *v > upper_bound {
                *exceed.entry(stratum).or_insert(0) += 1;
            } else {
                keep.entry(stratum).or_default().push(*v);
            }
        }

        if exceed.is_empty() {
            debug!("No values of '{}' exceed the upper bound", target);
            return Ok(OutlierCorrection {
                lower_bound,
                upper_bound,
                per_stratum: Vec::new(),
            });
        }

        // One replacement value per affected stratum, computed without the
        // outliers themselves.
        let mut replacement: HashMap<&str, f64> = HashMap::new();
        for stratum in exceed.keys().copied() {
            let survivors = keep.get(stratum).map(Vec::as_slice).unwrap_or(&[]);
            match mean(survivors) {
                Some(m) => {
                    replacement.insert(stratum, m);
                }
                None => {
                    return Err(AnalysisError::DegenerateStratum {
                        column: target.to_string(),
                        stratum: stratum.to_string(),
                    });
                }
            }
        }

        let corrected: Vec<Option<f64>> = values
            .iter()
            .zip(groups.iter())
            .map(|(v, g)| {
                v.map(|v| {
                    if v > upper_bound {
                        let stratum = g.as_deref().unwrap_or(MISSING_STRATUM);
                        replacement[stratum]
                    } else {
                        v
                    }
                })
            })
            .collect();
        df.replace(target, Series::new(target.into(), corrected))?;

        let mut per_stratum: Vec<(String, usize)> = exceed
            .into_iter()
            .map(|(stratum, count)| (stratum.to_string(), count))
            .collect();
        per_stratum.sort();

        for (stratum, count) in &per_stratum {
            processing_steps.push(format!(
                "Replaced {} outlier '{}' values in stratum '{}' with the stratum mean {:.2}",
                count, target, stratum, replacement[stratum.as_str()]
            ));
        }

        Ok(OutlierCorrection {
            lower_bound,
            upper_bound,
            per_stratum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salary_values(df: &DataFrame) -> Vec<f64> {
        optional_numeric_values(df.column("SALARY").unwrap().as_materialized_series())
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    // ==================== BoundRule tests ====================

    #[test]
    fn test_sigma_bounds() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // mean = 5, population std = 2
        let (lower, upper) = BoundRule::Sigma { k: 3.0 }.bounds("v", &values).unwrap();
        assert!((lower - (-1.0)).abs() < 1e-9);
        assert!((upper - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_sigma_bounds_zero_variance_is_degenerate() {
        let err = BoundRule::Sigma { k: 3.0 }
            .bounds("v", &[5.0, 5.0, 5.0])
            .unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_STATISTIC");
    }

    #[test]
    fn test_iqr_bounds() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        // q1 = 2, q3 = 4, iqr = 2 -> [-1, 7]
        let (lower, upper) = BoundRule::Interquartile { factor: 1.5 }
            .bounds("v", &values)
            .unwrap();
        assert!((lower - (-1.0)).abs() < 1e-9);
        assert!((upper - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_is_degenerate() {
        let err = BoundRule::Interquartile { factor: 1.5 }
            .bounds("v", &[])
            .unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_STATISTIC");
    }

    // ==================== Correction tests ====================

    fn spiked_frame() -> DataFrame {
        // "low" bracket sits near 10-25, "high" near 100, plus one wild
        // value in the high bracket. Enough rows that a single spike can
        // clear the 3-sigma fence (max z-score is (n-1)/sqrt(n)).
        let mut brackets: Vec<&str> = vec!["low"; 16];
        brackets.extend(["high"; 4]);
        let mut salaries: Vec<f64> = (10..26).map(|v| v as f64).collect();
        salaries.extend([100.0, 110.0, 120.0, 100_000.0]);
        df![
            "SALARY_BRACKET" => brackets,
            "SALARY" => salaries,
        ]
        .unwrap()
    }

    #[test]
    fn test_correction_is_stratum_local() {
        let mut df = spiked_frame();
        let mut steps = Vec::new();

        let report = OutlierCorrector::correct_upper_by_group(
            &mut df,
            "SALARY",
            "SALARY_BRACKET",
            &BoundRule::Sigma { k: 3.0 },
            &mut steps,
        )
        .unwrap();

        assert_eq!(report.corrected(), 1);
        let values = salary_values(&df);
        // the spike was replaced with the mean of its own bracket's
        // survivors, (100 + 110 + 120) / 3
        assert!((values[19] - 110.0).abs() < 1e-9);
        // the low bracket is untouched
        assert_eq!(&values[..3], &[10.0, 11.0, 12.0]);
        assert!(steps.iter().any(|s| s.contains("high")));
    }

    #[test]
    fn test_no_value_exceeds_bound_after_correction() {
        let mut df = spiked_frame();
        let mut steps = Vec::new();

        let report = OutlierCorrector::correct_upper_by_group(
            &mut df,
            "SALARY",
            "SALARY_BRACKET",
            &BoundRule::Sigma { k: 3.0 },
            &mut steps,
        )
        .unwrap();

        assert!(
            salary_values(&df)
                .iter()
                .all(|v| *v <= report.upper_bound)
        );
    }

    #[test]
    fn test_degenerate_stratum_is_an_error() {
        // every member of the "solo" bracket exceeds the bound, so there is
        // nothing to compute its replacement from
        let mut brackets: Vec<&str> = vec!["low"; 12];
        brackets.push("solo");
        let mut salaries: Vec<f64> = (10..22).map(|v| v as f64).collect();
        salaries.push(100_000.0);
        let mut df = df![
            "SALARY_BRACKET" => brackets,
            "SALARY" => salaries,
        ]
        .unwrap();
        let mut steps = Vec::new();

        let err = OutlierCorrector::correct_upper_by_group(
            &mut df,
            "SALARY",
            "SALARY_BRACKET",
            &BoundRule::Sigma { k: 3.0 },
            &mut steps,
        )
        .unwrap_err();

        match err {
            AnalysisError::DegenerateStratum { column, stratum } => {
                assert_eq!(column, "SALARY");
                assert_eq!(stratum, "solo");
            }
            other => panic!("expected DegenerateStratum, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_column_is_untouched() {
        let mut df = df![
            "SALARY_BRACKET" => ["a", "a", "b", "b"],
            "SALARY" => [10.0, 12.0, 11.0, 13.0],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let report = OutlierCorrector::correct_upper_by_group(
            &mut df,
            "SALARY",
            "SALARY_BRACKET",
            &BoundRule::Sigma { k: 3.0 },
            &mut steps,
        )
        .unwrap();

        assert_eq!(report.corrected(), 0);
        assert_eq!(salary_values(&df), vec![10.0, 12.0, 11.0, 13.0]);
        assert!(steps.is_empty());
    }

    #[test]
    fn test_missing_values_survive_correction() {
        let mut df = df![
            "SALARY_BRACKET" => ["a", "a", "a", "a", "a"],
            "SALARY" => [Some(10.0), Some(11.0), None, Some(12.0), Some(13.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        // IQR rule so the tight cluster is not degenerate
        OutlierCorrector::correct_upper_by_group(
            &mut df,
            "SALARY",
            "SALARY_BRACKET",
            &BoundRule::Interquartile { factor: 1.5 },
            &mut steps,
        )
        .unwrap();

        let column = df.column("SALARY").unwrap();
        assert_eq!(column.null_count(), 1);
    }
}
