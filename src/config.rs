//! Configuration types for the survey analysis pipeline.
//!
//! Uses the builder pattern for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Column names of the survey table.
///
/// Defaults match the column layout the pipeline was built for; override
/// individual names when a source uses different headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySchema {
    /// Unique respondent identifier.
    pub id: String,
    /// Exact age in years (numeric, may be missing).
    pub age: String,
    /// Coarse age bracket, e.g. "17-21" (categorical).
    pub age_bracket: String,
    /// Gender (categorical, may be missing).
    pub gender: String,
    /// Monthly salary (numeric, may be missing).
    pub salary: String,
    /// Coarse salary bracket (categorical).
    pub salary_bracket: String,
    /// Seniority level (categorical).
    pub seniority: String,
    /// Manager flag (0/1).
    pub manager_flag: String,
    /// Education level (categorical).
    pub education: String,
    /// Ethnicity (categorical).
    pub ethnicity: String,
    /// State of residence, the key into the regional income lookup.
    pub state: String,
    /// Free-text job-change intent, present on the secondary table.
    pub job_intent: String,
}

impl Default for SurveySchema {
    fn default() -> Self {
        Self {
            id: "ID".to_string(),
            age: "AGE".to_string(),
            age_bracket: "AGE_BRACKET".to_string(),
            gender: "GENDER".to_string(),
            salary: "SALARY".to_string(),
            salary_bracket: "SALARY_BRACKET".to_string(),
            seniority: "SENIORITY".to_string(),
            manager_flag: "IS_MANAGER".to_string(),
            education: "EDUCATION".to_string(),
            ethnicity: "ETHNICITY".to_string(),
            state: "STATE".to_string(),
            job_intent: "JOB_CHANGE_INTENT".to_string(),
        }
    }
}

/// Rule defining the interval outside which a value counts as an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundRule {
    /// mean +/- k * population standard deviation.
    Sigma { k: f64 },
    /// Q1 - factor * IQR .. Q3 + factor * IQR, quartiles linearly
    /// interpolated.
    Interquartile { factor: f64 },
}

impl Default for BoundRule {
    fn default() -> Self {
        BoundRule::Sigma { k: 3.0 }
    }
}

/// Configuration for the analysis pipeline.
///
/// Use [`PipelineConfig::builder()`] for a fluent API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Column names of the survey table.
    pub schema: SurveySchema,

    /// Outlier bound rule applied to the salary column.
    /// Default: Sigma { k: 3.0 }
    pub bound_rule: BoundRule,

    /// Label used to fill missing gender values.
    pub gender_fill_label: String,

    /// Confidence level for the salary mean interval (0.0 - 1.0, exclusive).
    /// Default: 0.95
    pub confidence_level: f64,

    /// Substring tokens matched (case-insensitively) against the job-intent
    /// column; each produces one nullable boolean flag column.
    pub intent_flags: Vec<(String, String)>,

    /// Output directory for the exported table and reports.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Base name (without extension) for output files.
    /// Default: "survey_processed"
    pub output_name: String,

    /// Whether to build chart data and write it alongside the table.
    /// Default: true
    pub write_charts: bool,

    /// Whether to write output files at all. When false, results are kept
    /// in memory only.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema: SurveySchema::default(),
            bound_rule: BoundRule::default(),
            gender_fill_label: "Prefer not to say".to_string(),
            confidence_level: 0.95,
            intent_flags: vec![
                ("JOB_SEEKING".to_string(), "actively looking".to_string()),
                ("OPEN_TO_OFFERS".to_string(), "open to".to_string()),
            ],
            output_dir: PathBuf::from("output"),
            output_name: "survey_processed".to_string(),
            write_charts: true,
            save_to_disk: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigValidationError::InvalidConfidenceLevel(
                self.confidence_level,
            ));
        }

        match self.bound_rule {
            BoundRule::Sigma { k } if k <= 0.0 => {
                return Err(ConfigValidationError::InvalidBoundRule(format!(
                    "sigma multiplier must be positive, got {k}"
                )));
            }
            BoundRule::Interquartile { factor } if factor <= 0.0 => {
                return Err(ConfigValidationError::InvalidBoundRule(format!(
                    "IQR factor must be positive, got {factor}"
                )));
            }
            _ => {}
        }

        if self.output_name.is_empty() {
            return Err(ConfigValidationError::EmptyOutputName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid confidence level: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidConfidenceLevel(f64),

    #[error("Invalid bound rule: {0}")]
    InvalidBoundRule(String),

    #[error("Output name must not be empty")]
    EmptyOutputName,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    schema: Option<SurveySchema>,
    bound_rule: Option<BoundRule>,
    gender_fill_label: Option<String>,
    confidence_level: Option<f64>,
    intent_flags: Option<Vec<(String, String)>>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    write_charts: Option<bool>,
    save_to_disk: Option<bool>,
}

impl PipelineConfigBuilder {
    pub fn schema(mut self, schema: SurveySchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn bound_rule(mut self, rule: BoundRule) -> Self {
        self.bound_rule = Some(rule);
        self
    }

    pub fn gender_fill_label(mut self, label: impl Into<String>) -> Self {
        self.gender_fill_label = Some(label.into());
        self
    }

    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = Some(level);
        self
    }

    /// Replace the intent-flag table: (new column name, substring token).
    pub fn intent_flags(mut self, flags: Vec<(String, String)>) -> Self {
        self.intent_flags = Some(flags);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn write_charts(mut self, enabled: bool) -> Self {
        self.write_charts = Some(enabled);
        self
    }

    pub fn save_to_disk(mut self, enabled: bool) -> Self {
        self.save_to_disk = Some(enabled);
        self
    }

    /// Build the configuration, validating it first.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            schema: self.schema.unwrap_or(defaults.schema),
            bound_rule: self.bound_rule.unwrap_or(defaults.bound_rule),
            gender_fill_label: self.gender_fill_label.unwrap_or(defaults.gender_fill_label),
            confidence_level: self.confidence_level.unwrap_or(defaults.confidence_level),
            intent_flags: self.intent_flags.unwrap_or(defaults.intent_flags),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name.unwrap_or(defaults.output_name),
            write_charts: self.write_charts.unwrap_or(defaults.write_charts),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
        };
        config.validate()?;
        Ok(config)
    }
}
