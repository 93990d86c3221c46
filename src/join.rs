//! Left-outer joins with auxiliary sources.

use crate::error::{AnalysisError, Result};
use crate::sources::StateIncome;
use polars::prelude::*;
use tracing::debug;

/// Column name the regional average income lands in after the join.
pub const REGIONAL_INCOME_COLUMN: &str = "REGIONAL_AVG_INCOME";

/// Left-outer join of `primary` with `secondary` on one key column.
///
/// Every primary row is preserved; unmatched secondary columns come back
/// null; a key matching several secondary rows fans the primary row out
/// (callers counting rows after the join must account for the extras).
/// Key equality is exact, with no fuzzy or case-insensitive matching.
pub fn left_join(primary: &DataFrame, secondary: &DataFrame, key: &str) -> Result<DataFrame> {
    if primary.column(key).is_err() {
        return Err(AnalysisError::JoinKeyMismatch {
            key: key.to_string(),
            side: "primary".to_string(),
        });
    }
    if secondary.column(key).is_err() {
        return Err(AnalysisError::JoinKeyMismatch {
            key: key.to_string(),
            side: "secondary".to_string(),
        });
    }

    let joined = primary
        .clone()
        .lazy()
        .join(
            secondary.clone().lazy(),
            [col(key)],
            [col(key)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    debug!(
        "Left join on '{}': {} x {} -> {} rows",
        key,
        primary.height(),
        secondary.height(),
        joined.height()
    );
    Ok(joined)
}

/// Build the regional-income side table from relational lookup rows, keyed
/// by `state_column` so it joins straight onto the survey table.
pub fn regional_income_frame(rows: &[StateIncome], state_column: &str) -> Result<DataFrame> {
    let states: Vec<String> = rows.iter().map(|r| r.state.clone()).collect();
    let incomes: Vec<f64> = rows.iter().map(|r| r.average_income).collect();

    let df = DataFrame::new(vec![
        Series::new(state_column.into(), states).into(),
        Series::new(REGIONAL_INCOME_COLUMN.into(), incomes).into(),
    ])?;
    Ok(df)
}
