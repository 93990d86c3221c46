//! Tabular file loading.

use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, error};

/// Loads tabular datasets by path, dispatching on the file extension.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a dataset from a CSV or Parquet file.
    pub fn load(path: &Path) -> Result<DataFrame> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "csv" => Self::load_csv(path),
            "parquet" => Self::load_parquet(path),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unsupported input format '{other}' for {}",
                path.display()
            ))),
        }
    }

    /// Load a CSV with multiple fallback strategies.
    fn load_csv(path: &Path) -> Result<DataFrame> {
        // Strategy 1: standard loading with quote handling
        match CsvReadOptions::default()
            .with_infer_schema_length(Some(100))
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
        {
            Ok(df) => return Ok(df),
            Err(e) => {
                debug!("Standard CSV loading failed: {}", e);
            }
        }

        // Strategy 2: without quote handling
        match CsvReadOptions::default()
            .with_infer_schema_length(Some(100))
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
        {
            Ok(df) => return Ok(df),
            Err(e) => {
                debug!("CSV loading without quotes failed: {}", e);
            }
        }

        // Strategy 3: pre-clean the content
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cleaned = Self::clean_csv_content(&content);
                let cursor = std::io::Cursor::new(cleaned);

                CsvReadOptions::default()
                    .with_infer_schema_length(Some(100))
                    .with_has_header(true)
                    .into_reader_with_file_handle(cursor)
                    .finish()
                    .map_err(AnalysisError::Polars)
            }
            Err(e) => {
                error!("Could not read file {}: {}", path.display(), e);
                Err(e.into())
            }
        }
    }

    fn load_parquet(path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;
        ParquetReader::new(file)
            .finish()
            .map_err(AnalysisError::Polars)
    }

    /// Strip doubled quotes and blank lines that break strict parsing.
    fn clean_csv_content(content: &str) -> String {
        content
            .replace("\"\"\"", "\"")
            .replace("\"\"", "\"")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "ID,AGE,GENDER").unwrap();
        writeln!(file, "r1,25,Female").unwrap();
        writeln!(file, "r2,31,Male").unwrap();
        drop(file);

        let df = DatasetLoader::load(&path).unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert!(df.column("AGE").is_ok());
    }

    #[test]
    fn test_load_csv_with_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.csv");
        std::fs::write(&path, "A,B\n1,2\n\n3,4\n").unwrap();

        let df = DatasetLoader::load(&path).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let err = DatasetLoader::load(Path::new("data.xlsx")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_clean_csv_content() {
        let cleaned = DatasetLoader::clean_csv_content("a,\"\"b\"\"\n\n1,2\n");
        assert_eq!(cleaned, "a,\"b\"\n1,2");
    }
}
