//! Exploratory filtering and aggregation over the survey table.
//!
//! Thin, composable building blocks: boolean masks for row selection and
//! hand-rolled group aggregations. Masks combine with `&`/`|`, mirroring
//! how ad-hoc analysis stacks conditions.

mod aggregate;
mod filters;

pub use aggregate::{
    CategoryCount, mean_by_numeric_group, pivot_counts, unique_count_by_group, value_counts,
};
pub use filters::{contains_mask, eq_mask, ge_mask, gt_mask, lt_mask};
