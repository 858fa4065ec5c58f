use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::import::{
    parse_activity_date, parse_decimal_or_zero, parse_heart_rate, ActivityImporter, ImportError,
};
use crate::models::Activity;

/// CSV importer for spreadsheet exports with flexible column mapping
pub struct CsvActivityImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvActivityImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(
            &mut column_mapping,
            "activity_id",
            &["activity_id", "id", "activityid"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "date",
            &["date", "start_time", "start_time_local", "starttimelocal"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "type",
            &["type", "activity_type", "sport"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "duration",
            &["duration", "duration_min", "duration_minutes", "moving_time_min"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "avg_hr",
            &["avg_hr", "average_hr", "avg_heart_rate", "averagehr", "heart_rate", "hr"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "max_hr",
            &["max_hr", "maximum_hr", "max_heart_rate", "maxhr"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "distance",
            &["distance", "distance_km", "dist"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "elevation_gain",
            &["elevation_gain", "elevation_gain_m", "elevation", "total_elevation_gain"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    /// "Duration (min)" -> "duration_min" -> mapped standard name
    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name
            .trim()
            .to_lowercase()
            .replace(['(', ')'], "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .replace('-', "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }
}

impl Default for CsvActivityImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityImporter for CsvActivityImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>, ImportError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(file_path)?;

        let headers = reader.headers()?.clone();
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (self.normalize_column_name(header), i))
            .collect();

        let cell = |record: &csv::StringRecord, name: &str| -> String {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .unwrap_or("")
                .trim()
                .to_string()
        };

        let mut activities = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let raw_date = cell(&record, "date");

            let Some(date) = parse_activity_date(&raw_date) else {
                warn!(row = row + 1, value = %raw_date, "Skipping row with unparseable date");
                continue;
            };

            let id = match cell(&record, "activity_id") {
                id if id.is_empty() => format!("{}-{}", date, row + 1),
                id => id,
            };

            activities.push(Activity {
                id,
                date,
                activity_type: cell(&record, "type"),
                duration_min: parse_decimal_or_zero(&cell(&record, "duration")),
                avg_hr: parse_heart_rate(&cell(&record, "avg_hr")),
                max_hr: parse_heart_rate(&cell(&record, "max_hr")),
                distance_km: parse_decimal_or_zero(&cell(&record, "distance")),
                elevation_gain_m: parse_decimal_or_zero(&cell(&record, "elevation_gain")),
            });
        }

        Ok(activities)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}
