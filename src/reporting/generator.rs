//! Writers for the pipeline's output artifacts.

use crate::charts::ChartSet;
use crate::error::Result;
use crate::types::{RunSummary, StatisticsReport};
use chrono::Local;
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::info;

/// Writes the processed table and its companion JSON reports.
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: String,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    generated_at: String,
    summary: &'a RunSummary,
    statistics: &'a StatisticsReport,
    processing_steps: &'a [String],
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf, output_name: impl Into<String>) -> Self {
        Self {
            output_dir,
            output_name: output_name.into(),
        }
    }

    /// Write the processed table as `<output_name>.csv`.
    pub fn write_table(&self, df: &mut DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.csv", self.output_name));
        let mut file = File::create(&path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)?;

        info!("Dataset saved: {}", path.display());
        Ok(path)
    }

    /// Write the chart data as `<output_name>_charts.json`.
    pub fn write_charts(&self, charts: &ChartSet) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}_charts.json", self.output_name));
        fs::write(&path, serde_json::to_string_pretty(charts)?)?;

        info!("Chart data saved: {}", path.display());
        Ok(path)
    }

    /// Write the run summary as `<output_name>_summary.json`.
    pub fn write_summary(
        &self,
        summary: &RunSummary,
        statistics: &StatisticsReport,
        processing_steps: &[String],
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}_summary.json", self.output_name));

        let document = SummaryDocument {
            generated_at: Local::now().to_rfc3339(),
            summary,
            statistics,
            processing_steps,
        };
        fs::write(&path, serde_json::to_string_pretty(&document)?)?;

        info!("Run summary saved: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{ConfidenceInterval, ContingencyTable};

    fn statistics() -> StatisticsReport {
        StatisticsReport {
            age_salary_correlation: 0.42,
            salary_regional_income_correlation: None,
            salary_mean_interval: ConfidenceInterval {
                level: 0.95,
                mean: 10.0,
                lower: 9.0,
                upper: 11.0,
            },
            ethnicity_education_counts: ContingencyTable {
                row_column: "ETHNICITY".to_string(),
                col_column: "EDUCATION".to_string(),
                row_labels: vec!["A".to_string()],
                col_labels: vec!["Degree".to_string()],
                counts: vec![vec![3]],
            },
        }
    }

    #[test]
    fn test_write_table_creates_csv() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf(), "run");
        let mut df = df![
            "ID" => ["r1", "r2"],
            "AGE" => [25.0, 31.0],
        ]
        .unwrap();

        let path = generator.write_table(&mut df).unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("ID,AGE"));
        assert!(content.contains("r2"));
    }

    #[test]
    fn test_write_summary_embeds_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf(), "run");

        let path = generator
            .write_summary(&RunSummary::new(), &statistics(), &["step one".to_string()])
            .unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("age_salary_correlation"));
        assert!(content.contains("step one"));
        assert!(content.contains("generated_at"));
    }
}
