use crate::models::Activity;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

pub mod csv;
pub mod json;

/// Activity import errors
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No importer found for file: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Trait for reading activities from an activity source export
pub trait ActivityImporter {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read all activities from the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>, ImportError>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Dispatches a file to the first importer that accepts it
pub struct ImportManager {
    importers: Vec<Box<dyn ActivityImporter>>,
}

impl ImportManager {
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ActivityImporter>> = vec![
            Box::new(csv::CsvActivityImporter::new()),
            Box::new(json::JsonActivityImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format, dropping repeated activity ids
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>, ImportError> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                path: file_path.to_path_buf(),
            })?;

        let activities = dedup_by_id(importer.import_file(file_path)?);
        info!(
            file = %file_path.display(),
            format = importer.format_name(),
            activities = activities.len(),
            "Imported activities"
        );
        Ok(activities)
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the first activity for each id, preserving order
pub fn dedup_by_id(activities: Vec<Activity>) -> Vec<Activity> {
    let mut seen = HashSet::new();
    activities
        .into_iter()
        .filter(|activity| seen.insert(activity.id.clone()))
        .collect()
}

/// Parse the calendar date out of a date or date-time cell
pub(crate) fn parse_activity_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ];
    for format in &datetime_formats {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    let date_formats = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];
    date_formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Numeric cell, coercing anything unparseable to zero
pub(crate) fn parse_decimal_or_zero(value: &str) -> Decimal {
    Decimal::from_str(value.trim()).unwrap_or(Decimal::ZERO)
}

/// Heart rate cell ("150" or "150.0"), coercing anything unparseable to zero
pub(crate) fn parse_heart_rate(value: &str) -> u16 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|hr| hr.is_finite() && *hr > 0.0)
        .map(|hr| hr.round().min(f64::from(u16::MAX)) as u16)
        .unwrap_or(0)
}
