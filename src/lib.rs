//! Survey Analysis Pipeline Library
//!
//! A batch cleaning and statistical analysis pipeline for workforce survey
//! data, built on Polars.
//!
//! # Overview
//!
//! One `process` call takes a loaded survey table through the whole run:
//!
//! - **Profiling**: dtypes, null counts, unique counts, summary statistics
//! - **Imputation**: stratified means with global fallback, medians,
//!   constant labels
//! - **Outlier correction**: sigma or IQR bounds, bracket-local replacement
//! - **Feature engineering**: role labels, generation buckets, intent
//!   flags, one-hot encoding
//! - **Joins**: secondary tables and a relational regional-income lookup
//! - **Statistics**: Pearson correlation, Student-t confidence intervals,
//!   contingency tables
//! - **Export**: processed CSV plus chart-data and run-summary JSON
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use survey_processing::{Pipeline, PipelineConfig};
//! use survey_processing::sources::{DatasetLoader, RegionalIncomeStore};
//! use survey_processing::join::regional_income_frame;
//! use std::path::Path;
//!
//! let survey = DatasetLoader::load(Path::new("survey.csv"))?;
//! let extra = DatasetLoader::load(Path::new("survey_extra.csv"))?;
//!
//! let store = RegionalIncomeStore::open(Path::new("income.db"))?;
//! let states = vec!["SP".to_string(), "RJ".to_string()];
//! let income = regional_income_frame(
//!     &store.average_income_by_state(&states)?,
//!     "STATE",
//! )?;
//!
//! let result = Pipeline::builder()
//!     .config(PipelineConfig::builder().output_dir("out").build()?)
//!     .secondary(extra)
//!     .regional_income(income)
//!     .build()?
//!     .process(survey)?;
//!
//! println!("age/salary correlation: {:.3}", result.statistics.age_salary_correlation);
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod explore;
pub mod features;
pub mod imputers;
pub mod join;
pub mod outliers;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod sources;
pub mod stats;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::{BarChart, ChartSet, LineChart, Point, ScatterChart};
pub use config::{
    BoundRule, ConfigValidationError, PipelineConfig, PipelineConfigBuilder, SurveySchema,
};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt};
pub use explore::CategoryCount;
pub use features::{Generation, MANAGEMENT_LABEL};
pub use imputers::{CentralTendency, StatisticalImputer};
pub use outliers::{OutlierCorrection, OutlierCorrector};
pub use pipeline::{GENERATION_COLUMN, Pipeline, PipelineBuilder, ROLE_LABEL_COLUMN};
pub use profiler::DataProfiler;
pub use reporting::ReportGenerator;
pub use sources::{DatasetLoader, RegionalIncomeStore, StateIncome};
pub use stats::{ConfidenceInterval, ContingencyTable};
pub use types::{
    ColumnProfile, DatasetProfile, PipelineResult, RunSummary, StageAction, StatisticsReport,
};
