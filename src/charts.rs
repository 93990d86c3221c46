//! Chart data for the exported visualizations.
//!
//! Rendering is delegated to external viewers; this module only computes
//! the serializable data each chart needs (bars, line points, scatter
//! points), which the exporter writes as JSON next to the processed table.

use crate::config::SurveySchema;
use crate::error::Result;
use crate::explore::{CategoryCount, mean_by_numeric_group, value_counts};
use crate::utils::optional_numeric_values;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A single (x, y) point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Bar chart data: one bar per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<CategoryCount>,
}

/// Line chart data: points sorted by x.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<Point>,
}

/// Scatter chart data: complete-case point cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<Point>,
}

/// The full set of charts produced by one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSet {
    pub respondents_by_gender: BarChart,
    pub mean_salary_by_age: LineChart,
    pub age_vs_salary: ScatterChart,
}

/// Build every chart from the transformed table.
pub fn build_chart_set(df: &DataFrame, schema: &SurveySchema) -> Result<ChartSet> {
    Ok(ChartSet {
        respondents_by_gender: gender_bar_chart(df, schema)?,
        mean_salary_by_age: salary_by_age_line(df, schema)?,
        age_vs_salary: age_salary_scatter(df, schema)?,
    })
}

fn gender_bar_chart(df: &DataFrame, schema: &SurveySchema) -> Result<BarChart> {
    Ok(BarChart {
        title: "Respondents by gender".to_string(),
        x_label: "Gender".to_string(),
        y_label: "Respondents".to_string(),
        bars: value_counts(df, &schema.gender, false)?,
    })
}

fn salary_by_age_line(df: &DataFrame, schema: &SurveySchema) -> Result<LineChart> {
    let points = mean_by_numeric_group(df, &schema.age, &schema.salary)?
        .into_iter()
        .map(|(x, y)| Point { x, y })
        .collect();
    Ok(LineChart {
        title: "Mean salary by age".to_string(),
        x_label: "Age".to_string(),
        y_label: "Salary".to_string(),
        points,
    })
}

fn age_salary_scatter(df: &DataFrame, schema: &SurveySchema) -> Result<ScatterChart> {
    let ages = optional_numeric_values(
        df.column(&schema.age)
            .map_err(|_| crate::error::AnalysisError::ColumnNotFound(schema.age.clone()))?
            .as_materialized_series(),
    )?;
    let salaries = optional_numeric_values(
        df.column(&schema.salary)
            .map_err(|_| crate::error::AnalysisError::ColumnNotFound(schema.salary.clone()))?
            .as_materialized_series(),
    )?;

    let points = ages
        .into_iter()
        .zip(salaries)
        .filter_map(|(age, salary)| match (age, salary) {
            (Some(x), Some(y)) => Some(Point { x, y }),
            _ => None,
        })
        .collect();

    Ok(ScatterChart {
        title: "Age vs salary".to_string(),
        x_label: "Age".to_string(),
        y_label: "Salary".to_string(),
        points,
    })
}
