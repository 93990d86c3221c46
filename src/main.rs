//! CLI entry point for the survey analysis pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use survey_processing::join::regional_income_frame;
use survey_processing::profiler::DataProfiler;
use survey_processing::sources::{DatasetLoader, RegionalIncomeStore};
use survey_processing::{BoundRule, Pipeline, PipelineConfig, PipelineResult};
use tracing::info;

/// CLI-compatible outlier bound rule.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliBoundRule {
    /// mean +/- k * standard deviation
    Sigma,
    /// quartiles +/- factor * IQR
    Iqr,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Survey cleaning and statistical analysis pipeline",
    long_about = "Cleans a workforce survey table (imputation, outlier correction, feature\n\
                  engineering, auxiliary joins) and computes descriptive statistics.\n\n\
                  EXAMPLES:\n  \
                  # Basic run\n  \
                  survey-processing -i survey.csv\n\n  \
                  # With the secondary table and the regional income database\n  \
                  survey-processing -i survey.csv --extra survey_extra.csv --income-db income.db\n\n  \
                  # Preview without processing\n  \
                  survey-processing -i survey.csv --dry-run"
)]
struct Args {
    /// Path to the survey table (CSV or Parquet)
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the secondary table joined on the identifier column
    #[arg(long)]
    extra: Option<PathBuf>,

    /// Path to the SQLite regional income database
    #[arg(long)]
    income_db: Option<PathBuf>,

    /// Output directory for results
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Base name (without extension) for output files
    #[arg(long, default_value = "survey_processed")]
    output_name: String,

    /// Confidence level for the salary mean interval
    #[arg(long, default_value = "0.95")]
    confidence: f64,

    /// Outlier bound rule applied to the salary column
    #[arg(long, value_enum, default_value = "sigma")]
    outlier_rule: CliBoundRule,

    /// Sigma multiplier (used with --outlier-rule sigma)
    #[arg(long, default_value = "3.0")]
    sigma_k: f64,

    /// IQR factor (used with --outlier-rule iqr)
    #[arg(long, default_value = "1.5")]
    iqr_factor: f64,

    /// Skip chart data generation
    #[arg(long)]
    no_charts: bool,

    /// Preview the dataset profile without processing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    info!("Loading dataset from: {}", args.input.display());
    let survey = DatasetLoader::load(&args.input)?;
    info!("Dataset loaded: {:?}", survey.shape());

    if args.dry_run {
        return run_dry_run(&args, &survey);
    }

    let bound_rule = match args.outlier_rule {
        CliBoundRule::Sigma => BoundRule::Sigma { k: args.sigma_k },
        CliBoundRule::Iqr => BoundRule::Interquartile {
            factor: args.iqr_factor,
        },
    };

    let config = PipelineConfig::builder()
        .bound_rule(bound_rule)
        .confidence_level(args.confidence)
        .output_dir(args.output.clone())
        .output_name(args.output_name.clone())
        .write_charts(!args.no_charts)
        .build()?;

    let mut builder = Pipeline::builder();

    if let Some(extra_path) = &args.extra {
        info!("Loading secondary table from: {}", extra_path.display());
        builder = builder.secondary(DatasetLoader::load(extra_path)?);
    }

    if let Some(db_path) = &args.income_db {
        builder = builder.regional_income(load_regional_income(db_path, &survey, &config)?);
    }

    let result = builder.config(config).build()?.process(survey)?;
    print_summary(&result, &args);
    Ok(())
}

/// Query the relational store for the average income of every state
/// observed in the survey.
fn load_regional_income(
    db_path: &Path,
    survey: &DataFrame,
    config: &PipelineConfig,
) -> Result<DataFrame> {
    info!("Opening regional income store: {}", db_path.display());
    let store = RegionalIncomeStore::open(db_path)?;

    let state_column = &config.schema.state;
    let states: Vec<String> = survey
        .column(state_column)
        .map_err(|_| anyhow!("Survey table has no '{state_column}' column"))?
        .as_materialized_series()
        .drop_nulls()
        .unique()?
        .str()?
        .into_iter()
        .flatten()
        .map(|s| s.to_string())
        .collect();

    info!("Querying average income for {} states", states.len());
    let rows = store.average_income_by_state(&states)?;
    Ok(regional_income_frame(&rows, state_column)?)
}

/// Print the dataset profile without processing anything.
fn run_dry_run(args: &Args, df: &DataFrame) -> Result<()> {
    println!("\n{}", "=".repeat(72));
    println!("DRY RUN - dataset profile");
    println!("{}\n", "=".repeat(72));

    println!("  File: {}", args.input.display());
    println!("  Rows: {}", df.height());
    println!("  Columns: {}", df.width());
    println!();

    let profile = DataProfiler::profile_dataset(df)?;

    println!(
        "{:<24} {:<12} {:<10} {:<10}",
        "Column", "Type", "Missing %", "Unique"
    );
    println!("{}", "-".repeat(60));
    for col in &profile.column_profiles {
        println!(
            "{:<24} {:<12} {:<10.1} {:<10}",
            truncate_str(&col.name, 23),
            col.inferred_type,
            col.null_percentage,
            col.unique_count
        );
    }

    if profile.duplicate_count > 0 {
        println!(
            "\n{} duplicate rows ({:.1}%)",
            profile.duplicate_count, profile.duplicate_percentage
        );
    }

    println!("\nTo process the dataset, run without --dry-run");
    Ok(())
}

/// Print a human-readable summary of the run.
fn print_summary(result: &PipelineResult, args: &Args) {
    let summary = &result.summary;
    let stats = &result.statistics;

    println!();
    println!("{}", "=".repeat(72));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(72));
    println!();
    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input.display(),
        summary.rows_before,
        summary.columns_before
    );
    println!(
        "Output: {} ({} rows x {} columns)",
        args.output.join(format!("{}.csv", args.output_name)).display(),
        summary.rows_after,
        summary.columns_after
    );
    println!();
    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Data Quality: {:.1}% -> {:.1}%",
        summary.data_quality_before * 100.0,
        summary.data_quality_after * 100.0
    );
    println!("  Outliers corrected: {}", summary.outliers_corrected);
    println!();
    println!("Statistics:");
    println!(
        "  Age/salary correlation: {:.4}",
        stats.age_salary_correlation
    );
    if let Some(r) = stats.salary_regional_income_correlation {
        println!("  Salary/regional income correlation: {:.4}", r);
    }
    let ci = &stats.salary_mean_interval;
    println!(
        "  Mean salary: {:.2} ({:.0}% CI [{:.2}, {:.2}])",
        ci.mean,
        ci.level * 100.0,
        ci.lower,
        ci.upper
    );
    println!(
        "  Contingency table: {} x {} categories, {} observations",
        stats.ethnicity_education_counts.row_labels.len(),
        stats.ethnicity_education_counts.col_labels.len(),
        stats.ethnicity_education_counts.total()
    );

    if !summary.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
    }

    if !result.processing_steps.is_empty() {
        println!();
        println!("Actions Taken:");
        for step in result.processing_steps.iter().take(8) {
            println!("  - {}", step);
        }
        if result.processing_steps.len() > 8 {
            println!(
                "  ... and {} more actions",
                result.processing_steps.len() - 8
            );
        }
    }
    println!("{}", "=".repeat(72));
}

/// Truncate a string to max length with ellipsis.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
