use crate::models::DailyLoadRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub mod csv;
pub mod json;
pub mod text;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Table,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "table" | "text" | "txt" => Ok(ExportFormat::Table),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Formatting error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

/// Render a load series in the requested format
pub fn render_series(records: &[DailyLoadRecord], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => csv::series_to_csv_string(records),
        ExportFormat::Json => json::to_json_string(&records),
        ExportFormat::Table => Ok(text::series_table(records)),
    }
}

/// Write a load series to a file in the requested format
pub fn write_series<P: AsRef<Path>>(
    records: &[DailyLoadRecord],
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => csv::export_series(records, output_path),
        ExportFormat::Json => json::export_json(&records, output_path),
        ExportFormat::Table => {
            std::fs::write(output_path, text::series_table(records))?;
            Ok(())
        }
    }
}
