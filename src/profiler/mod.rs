//! Dataset profiling: shapes, dtypes, null counts, and per-column
//! statistical characteristics.

mod statistics;

use crate::error::Result;
use crate::types::{ColumnProfile, DatasetProfile};
use crate::utils::{DtypeCategory, get_dtype_category};
use polars::prelude::*;
use rand::prelude::*;

pub(crate) use statistics::extract_column_characteristics;

/// Distinct-value ceiling below which a string column is treated as
/// categorical rather than free text.
const CATEGORICAL_UNIQUE_CEILING: usize = 25;

/// Data profiler for analyzing dataset structure and characteristics.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset: every column plus duplicate detection.
    pub fn profile_dataset(df: &DataFrame) -> Result<DatasetProfile> {
        let mut column_profiles = Vec::new();

        for col_name in df.get_column_names() {
            column_profiles.push(Self::profile_column(df, col_name)?);
        }

        let duplicate_count = df.height()
            - df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?
                .height();
        let duplicate_percentage = if df.height() > 0 {
            (duplicate_count as f64 / df.height() as f64) * 100.0
        } else {
            0.0
        };

        Ok(DatasetProfile {
            shape: (df.height(), df.width()),
            column_profiles,
            duplicate_count,
            duplicate_percentage,
        })
    }

    fn profile_column(df: &DataFrame, col_name: &str) -> Result<ColumnProfile> {
        let col = df.column(col_name)?;
        let series = col.as_materialized_series();
        let dtype = format!("{:?}", series.dtype());
        let unique_count = series.n_unique()?;
        let null_count = series.null_count();
        let null_percentage = if df.height() > 0 {
            (null_count as f64 / df.height() as f64) * 100.0
        } else {
            0.0
        };

        let sample_values = Self::sample_values(series);
        let inferred_type = Self::infer_type(series, unique_count);
        let characteristics = extract_column_characteristics(series, &inferred_type)?;

        Ok(ColumnProfile {
            name: col_name.to_string(),
            dtype,
            inferred_type,
            null_count,
            null_percentage,
            unique_count,
            sample_values,
            characteristics,
        })
    }

    /// Deterministic sample of non-null values (seeded so two profiles of
    /// the same table show the same samples).
    fn sample_values(series: &Series) -> Vec<String> {
        let non_null = series.drop_nulls();
        if non_null.is_empty() {
            return Vec::new();
        }

        let sample_size = std::cmp::min(10, non_null.len());
        let mut rng = StdRng::seed_from_u64(42);
        let indices: Vec<usize> = (0..non_null.len()).collect();
        let sampled: Vec<usize> = indices
            .choose_multiple(&mut rng, sample_size)
            .copied()
            .collect();

        let mut values = Vec::with_capacity(sample_size);
        for idx in sampled {
            if let Ok(val) = non_null.get(idx) {
                values.push(format!("{}", val));
            }
        }
        values
    }

    fn infer_type(series: &Series, unique_count: usize) -> String {
        match get_dtype_category(series.dtype()) {
            DtypeCategory::Numeric => "numeric".to_string(),
            DtypeCategory::Boolean => "boolean".to_string(),
            DtypeCategory::Datetime => "datetime".to_string(),
            DtypeCategory::String => {
                if unique_count <= CATEGORICAL_UNIQUE_CEILING {
                    "categorical".to_string()
                } else {
                    "string".to_string()
                }
            }
            DtypeCategory::Other => "other".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_dataset_shape_and_nulls() {
        let df = df![
            "ID" => [1i64, 2, 3, 4],
            "AGE" => [Some(25.0), None, Some(31.0), Some(40.0)],
            "GENDER" => [Some("Female"), Some("Male"), None, Some("Female")],
        ]
        .unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();

        assert_eq!(profile.shape, (4, 3));
        let age = profile.column("AGE").unwrap();
        assert_eq!(age.null_count, 1);
        assert_eq!(age.inferred_type, "numeric");
        assert!((age.null_percentage - 25.0).abs() < 1e-9);

        let gender = profile.column("GENDER").unwrap();
        assert_eq!(gender.inferred_type, "categorical");
    }

    #[test]
    fn test_profile_detects_duplicates() {
        let df = df![
            "A" => [1i64, 1, 2],
            "B" => ["x", "x", "y"],
        ]
        .unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(profile.duplicate_count, 1);
    }

    #[test]
    fn test_high_cardinality_string_is_text() {
        let values: Vec<String> = (0..100).map(|i| format!("respondent-{i}")).collect();
        let df = df!["NOTE" => values].unwrap();

        let profile = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(profile.column("NOTE").unwrap().inferred_type, "string");
    }

    #[test]
    fn test_sample_values_deterministic() {
        let df = df!["V" => (0..50).map(|i| i as f64).collect::<Vec<_>>()].unwrap();

        let first = DataProfiler::profile_dataset(&df).unwrap();
        let second = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(
            first.column("V").unwrap().sample_values,
            second.column("V").unwrap().sample_values
        );
    }
}
