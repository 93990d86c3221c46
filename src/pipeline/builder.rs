//! The main analysis pipeline.
//!
//! One `process` call runs every stage in order, threading the table value
//! through: profile, impute, correct outliers, engineer features, join
//! auxiliary sources, compute statistics, export. Each stage either
//! returns the transformed table or fails the run; nothing is retried and
//! no stage is skipped on error.

use crate::charts::{ChartSet, build_chart_set};
use crate::config::PipelineConfig;
use crate::error::{AnalysisError, Result, ResultExt as _};
use crate::features;
use crate::imputers::StatisticalImputer;
use crate::join::{self, REGIONAL_INCOME_COLUMN};
use crate::outliers::OutlierCorrector;
use crate::profiler::DataProfiler;
use crate::reporting::ReportGenerator;
use crate::stats;
use crate::types::{PipelineResult, RunSummary, StageAction, StatisticsReport};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, error, info};

/// Column added by the role-label derivation.
pub const ROLE_LABEL_COLUMN: &str = "ROLE_LABEL";
/// Column added by the generation bucketing.
pub const GENERATION_COLUMN: &str = "GENERATION";

/// The survey analysis pipeline.
///
/// Use [`Pipeline::builder()`] to configure and build one.
pub struct Pipeline {
    config: PipelineConfig,
    secondary: Option<DataFrame>,
    regional_income: Option<DataFrame>,
    reporter: ReportGenerator,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Run the full pipeline over a loaded survey table.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => {
                info!("Pipeline completed successfully");
                Ok(result)
            }
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let schema = &self.config.schema;

        let mut summary = RunSummary::new();
        summary.rows_before = df.height();
        summary.columns_before = df.width();
        summary.data_quality_before = data_quality_score(&df);

        let mut processing_steps: Vec<String> = Vec::new();

        // Stage 1: profile the incoming table
        info!("Step 1: Profiling dataset...");
        let profile_before = DataProfiler::profile_dataset(&df)?;
        debug!("Shape: {:?}", profile_before.shape);
        for col in &profile_before.column_profiles {
            debug!(
                "  {}: {} (inferred: {}, {:.1}% missing)",
                col.name, col.dtype, col.inferred_type, col.null_percentage
            );
        }

        // Stage 2: imputation
        info!("Step 2: Imputing missing values...");
        let mut df = df;
        StatisticalImputer::fill_constant_label(
            &mut df,
            &schema.gender,
            &self.config.gender_fill_label,
            &mut processing_steps,
        )
        .context("While filling gender")?;
        StatisticalImputer::impute_mean_by_group(
            &mut df,
            &schema.age,
            &schema.age_bracket,
            &mut processing_steps,
        )
        .context("While imputing age")?;
        StatisticalImputer::impute_median(&mut df, &schema.salary, &mut processing_steps)
            .context("While imputing salary")?;

        // Stage 3: outlier correction, bracket by bracket
        info!("Step 3: Correcting salary outliers...");
        let correction = OutlierCorrector::correct_upper_by_group(
            &mut df,
            &schema.salary,
            &schema.salary_bracket,
            &self.config.bound_rule,
            &mut processing_steps,
        )?;
        summary.outliers_corrected = correction.corrected();
        if correction.corrected() > 0 {
            summary.add_action(StageAction::new(
                "outliers",
                format!(
                    "Replaced {} salary values above {:.2}",
                    correction.corrected(),
                    correction.upper_bound
                ),
            ));
        }

        // Stage 4: feature engineering
        info!("Step 4: Deriving features...");
        features::add_role_label(
            &mut df,
            &schema.manager_flag,
            &schema.seniority,
            ROLE_LABEL_COLUMN,
            &mut processing_steps,
        )?;
        features::add_generation(&mut df, &schema.age, GENERATION_COLUMN, &mut processing_steps)?;
        let mut df = features::one_hot(df, &schema.seniority, &mut processing_steps)?;

        // Stage 5: secondary table join plus intent flags
        if let Some(secondary) = &self.secondary {
            info!("Step 5: Joining secondary table on '{}'...", schema.id);
            df = join::left_join(&df, secondary, &schema.id)?;
            processing_steps.push(format!("Joined secondary table on '{}'", schema.id));

            for (flag_column, token) in &self.config.intent_flags {
                features::add_contains_flag(
                    &mut df,
                    &schema.job_intent,
                    token,
                    flag_column,
                    &mut processing_steps,
                )?;
            }
        } else {
            debug!("No secondary table provided, skipping join");
        }

        // Stage 6: regional income join
        if let Some(income) = &self.regional_income {
            info!("Step 6: Joining regional income on '{}'...", schema.state);
            df = join::left_join(&df, income, &schema.state)?;
            processing_steps.push(format!("Joined regional income on '{}'", schema.state));
        }

        // Stage 7: statistics over the transformed table
        info!("Step 7: Computing statistics...");
        let age_salary_correlation = stats::pearson(&df, &schema.age, &schema.salary)?;
        let salary_regional_income_correlation = if self.regional_income.is_some() {
            Some(stats::pearson(&df, &schema.salary, REGIONAL_INCOME_COLUMN)?)
        } else {
            None
        };
        let salary_mean_interval =
            stats::column_confidence_interval(&df, &schema.salary, self.config.confidence_level)?;
        let ethnicity_education_counts =
            stats::contingency_table(&df, &schema.ethnicity, &schema.education)?;

        let statistics = StatisticsReport {
            age_salary_correlation,
            salary_regional_income_correlation,
            salary_mean_interval,
            ethnicity_education_counts,
        };

        // Stage 8: chart data
        let charts: Option<ChartSet> = if self.config.write_charts {
            info!("Step 8: Building chart data...");
            Some(build_chart_set(&df, schema)?)
        } else {
            None
        };

        // Stage 9: export
        if self.config.save_to_disk {
            info!("Step 9: Writing output files...");
            self.reporter.write_table(&mut df)?;
            if let Some(charts) = &charts {
                self.reporter.write_charts(charts)?;
            }
        }

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.data_quality_after = data_quality_score(&df);

        if summary.rows_after > summary.rows_before {
            summary.add_warning(format!(
                "Join fan-out: row count grew from {} to {}",
                summary.rows_before, summary.rows_after
            ));
        }

        if self.config.save_to_disk {
            self.reporter
                .write_summary(&summary, &statistics, &processing_steps)?;
        }

        Ok(PipelineResult {
            frame: df,
            profile_before,
            statistics,
            charts,
            summary,
            processing_steps,
        })
    }
}

/// Fraction of non-null cells in the table.
fn data_quality_score(df: &DataFrame) -> f64 {
    if df.height() == 0 || df.width() == 0 {
        return 0.0;
    }
    let total_cells = df.height() * df.width();
    let null_count: usize = df.get_columns().iter().map(|col| col.null_count()).sum();
    (total_cells - null_count) as f64 / total_cells as f64
}

/// Builder for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    secondary: Option<DataFrame>,
    regional_income: Option<DataFrame>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide the secondary table, joined on the identifier column.
    pub fn secondary(mut self, df: DataFrame) -> Self {
        self.secondary = Some(df);
        self
    }

    /// Provide the regional-income side table, joined on the state column.
    /// Build it with [`crate::join::regional_income_frame`] from relational
    /// lookup rows.
    pub fn regional_income(mut self, df: DataFrame) -> Self {
        self.regional_income = Some(df);
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;

        let reporter = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());

        Ok(Pipeline {
            config,
            secondary: self.secondary,
            regional_income: self.regional_income,
            reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.secondary.is_none());
        assert!(pipeline.regional_income.is_none());
        assert_eq!(pipeline.config.confidence_level, 0.95);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.confidence_level = 2.0;
        let err = Pipeline::builder().config(config).build().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_data_quality_score() {
        let df = df![
            "A" => [Some(1.0), None],
            "B" => [Some("x"), Some("y")],
        ]
        .unwrap();
        assert!((data_quality_score(&df) - 0.75).abs() < 1e-12);
    }
}
