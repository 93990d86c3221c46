//! Shared types describing profiles, run summaries, and pipeline results.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::charts::ChartSet;
use crate::stats::{ConfidenceInterval, ContingencyTable};

/// Profile of a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub inferred_type: String,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
    pub sample_values: Vec<String>,
    pub characteristics: HashMap<String, serde_json::Value>,
}

/// Profile of an entire dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub shape: (usize, usize),
    pub column_profiles: Vec<ColumnProfile>,
    pub duplicate_count: usize,
    pub duplicate_percentage: f64,
}

impl DatasetProfile {
    /// Look up a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.column_profiles.iter().find(|c| c.name == name)
    }
}

/// One recorded action taken by a pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageAction {
    pub stage: String,
    pub description: String,
}

impl StageAction {
    pub fn new(stage: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            description: description.into(),
        }
    }
}

/// Human-readable summary of a pipeline run, serialized into the summary
/// report next to the exported table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,

    /// Fraction of non-null cells before processing (0.0 - 1.0).
    pub data_quality_before: f64,
    /// Fraction of non-null cells after processing (0.0 - 1.0).
    pub data_quality_after: f64,

    /// Salary outliers replaced during correction.
    pub outliers_corrected: usize,

    /// Actions taken, stage by stage.
    pub actions: Vec<StageAction>,

    /// Warnings generated during the run.
    pub warnings: Vec<String>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            rows_before: 0,
            rows_after: 0,
            columns_before: 0,
            columns_after: 0,
            data_quality_before: 0.0,
            data_quality_after: 0.0,
            outliers_corrected: 0,
            actions: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: StageAction) {
        self.actions.push(action);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Statistics computed over the fully transformed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsReport {
    /// Pearson correlation between age and salary.
    pub age_salary_correlation: f64,
    /// Pearson correlation between salary and the joined regional average
    /// income, when the relational source was provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_regional_income_correlation: Option<f64>,
    /// Student-t confidence interval for the mean salary.
    pub salary_mean_interval: ConfidenceInterval,
    /// Ethnicity x education cross-tabulation.
    pub ethnicity_education_counts: ContingencyTable,
}

/// Result of a full pipeline run.
///
/// The transformed table is returned by value: each stage consumed and
/// passed it along, and the caller now owns the final state.
#[derive(Debug)]
pub struct PipelineResult {
    pub frame: DataFrame,
    pub profile_before: DatasetProfile,
    pub statistics: StatisticsReport,
    pub charts: Option<ChartSet>,
    pub summary: RunSummary,
    pub processing_steps: Vec<String>,
}
