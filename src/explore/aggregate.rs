//! Grouping and counting over the survey table.
//!
//! Aggregations are hand-rolled over the extracted values so the grouping
//! semantics (null buckets, tie order) stay explicit.

use crate::error::{AnalysisError, Result};
use crate::stats::{ContingencyTable, contingency_table};
use crate::utils::{optional_numeric_values, optional_string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Bucket label used when nulls are counted as their own group.
pub const MISSING_BUCKET: &str = "(missing)";

/// One category and its frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

fn series<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Series> {
    Ok(df
        .column(column)
        .map_err(|_| AnalysisError::ColumnNotFound(column.to_string()))?
        .as_materialized_series())
}

/// Frequency of each distinct value in a column, most frequent first
/// (ties broken by value). With `include_null`, nulls count as their own
/// [`MISSING_BUCKET`] entry.
pub fn value_counts(df: &DataFrame, column: &str, include_null: bool) -> Result<Vec<CategoryCount>> {
    let values = optional_string_values(series(df, column)?)?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;
    for value in values {
        match value {
            Some(v) => {
                *counts.entry(v).or_insert(0) += 1;
                total += 1;
            }
            None if include_null => {
                *counts.entry(MISSING_BUCKET.to_string()).or_insert(0) += 1;
                total += 1;
            }
            None => {}
        }
    }

    let mut entries: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(value, count)| CategoryCount {
            value,
            count,
            percentage: if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            },
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    Ok(entries)
}

/// Number of distinct `value` entries per `group` bucket, nulls included as
/// their own bucket. Buckets are returned in lexical order.
pub fn unique_count_by_group(
    df: &DataFrame,
    group: &str,
    value: &str,
) -> Result<Vec<(String, usize)>> {
    let groups = optional_string_values(series(df, group)?)?;
    let values = optional_string_values(series(df, value)?)?;

    let mut buckets: BTreeMap<String, HashSet<String>> = BTreeMap::new();
    for (g, v) in groups.into_iter().zip(values) {
        let bucket = g.unwrap_or_else(|| MISSING_BUCKET.to_string());
        if let Some(v) = v {
            buckets.entry(bucket).or_default().insert(v);
        } else {
            buckets.entry(bucket).or_default();
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(bucket, ids)| (bucket, ids.len()))
        .collect())
}

/// Pivot-style count table: rows = `index` categories, columns = `columns`
/// categories, cells = co-occurrence counts. Rows with a missing side are
/// skipped, as in the correlation layer.
pub fn pivot_counts(df: &DataFrame, index: &str, columns: &str) -> Result<ContingencyTable> {
    contingency_table(df, index, columns)
}

/// Mean of `value` per distinct numeric `group` key, sorted ascending by
/// key. Rows missing either side are skipped.
pub fn mean_by_numeric_group(
    df: &DataFrame,
    group: &str,
    value: &str,
) -> Result<Vec<(f64, f64)>> {
    let groups = optional_numeric_values(series(df, group)?)?;
    let values = optional_numeric_values(series(df, value)?)?;

    // f64 keys ordered through their bit pattern; keys come from data that
    // has already been cleaned of NaN by imputation.
    let mut sums: BTreeMap<u64, (f64, f64, usize)> = BTreeMap::new();
    for (g, v) in groups.into_iter().zip(values) {
        if let (Some(g), Some(v)) = (g, v) {
            if g.is_nan() {
                continue;
            }
            let entry = sums.entry(g.to_bits()).or_insert((g, 0.0, 0));
            entry.1 += v;
            entry.2 += 1;
        }
    }

    let mut points: Vec<(f64, f64)> = sums
        .into_values()
        .map(|(key, sum, count)| (key, sum / count as f64))
        .collect();
    points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df![
            "ID" => ["r1", "r2", "r3", "r4", "r5"],
            "GENDER" => [Some("Female"), Some("Male"), None, Some("Female"), Some("Female")],
            "AGE" => [Some(25.0), Some(25.0), Some(30.0), Some(30.0), None],
            "SALARY" => [Some(1000.0), Some(3000.0), Some(2000.0), Some(4000.0), Some(5000.0)],
        ]
        .unwrap()
    }

    #[test]
    fn test_value_counts_ordering() {
        let df = sample();
        let counts = value_counts(&df, "GENDER", false).unwrap();
        assert_eq!(counts[0].value, "Female");
        assert_eq!(counts[0].count, 3);
        assert_eq!(counts[1].count, 1);
        assert!((counts[0].percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_counts_with_null_bucket() {
        let df = sample();
        let counts = value_counts(&df, "GENDER", true).unwrap();
        let missing = counts.iter().find(|c| c.value == MISSING_BUCKET).unwrap();
        assert_eq!(missing.count, 1);
    }

    #[test]
    fn test_unique_count_by_group_includes_null_group() {
        let df = sample();
        let buckets = unique_count_by_group(&df, "GENDER", "ID").unwrap();
        assert_eq!(
            buckets,
            vec![
                ("(missing)".to_string(), 1),
                ("Female".to_string(), 3),
                ("Male".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_pivot_counts_cross_tabulates() {
        let df = df![
            "GENDER" => ["Female", "Female", "Male"],
            "IS_MANAGER" => ["0", "1", "0"],
        ]
        .unwrap();

        let table = pivot_counts(&df, "GENDER", "IS_MANAGER").unwrap();
        assert_eq!(table.count("Female", "1"), Some(1));
        assert_eq!(table.count("Male", "0"), Some(1));
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn test_mean_by_numeric_group_skips_incomplete_rows() {
        let df = sample();
        let points = mean_by_numeric_group(&df, "AGE", "SALARY").unwrap();
        assert_eq!(points, vec![(25.0, 2000.0), (30.0, 3000.0)]);
    }
}
