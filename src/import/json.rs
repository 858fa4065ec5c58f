use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

use crate::import::{parse_activity_date, ActivityImporter, ImportError};
use crate::models::Activity;

/// Activity record as dumped by the fitness platform's activity list endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlatformActivity {
    #[serde(default)]
    activity_id: Option<serde_json::Value>,
    #[serde(default)]
    start_time_local: Option<String>,
    #[serde(default)]
    activity_type: Option<PlatformActivityType>,
    /// Metres
    #[serde(default)]
    distance: Option<f64>,
    /// Seconds
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default, rename = "averageHR")]
    average_hr: Option<f64>,
    #[serde(default, rename = "maxHR")]
    max_hr: Option<f64>,
    #[serde(default)]
    total_elevation_gain: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlatformActivityType {
    type_key: String,
}

/// Importer for JSON activity dumps
pub struct JsonActivityImporter;

impl JsonActivityImporter {
    pub fn new() -> Self {
        JsonActivityImporter
    }

    fn to_decimal(value: Option<f64>, scale: f64) -> Decimal {
        value
            .filter(|v| v.is_finite())
            .and_then(|v| Decimal::from_f64(v / scale))
            .map(|d| d.round_dp(2))
            .unwrap_or(Decimal::ZERO)
    }

    fn to_heart_rate(value: Option<f64>) -> u16 {
        value
            .filter(|hr| hr.is_finite() && *hr > 0.0)
            .map(|hr| hr.round().min(f64::from(u16::MAX)) as u16)
            .unwrap_or(0)
    }

    fn convert(index: usize, raw: PlatformActivity) -> Option<Activity> {
        let start = raw.start_time_local.unwrap_or_default();
        let Some(date) = parse_activity_date(&start) else {
            warn!(index, value = %start, "Skipping activity with unparseable start time");
            return None;
        };

        let id = match raw.activity_id {
            Some(serde_json::Value::String(id)) => id,
            Some(serde_json::Value::Null) | None => format!("{}-{}", date, index + 1),
            Some(other) => other.to_string(),
        };

        Some(Activity {
            id,
            date,
            activity_type: raw
                .activity_type
                .map(|t| t.type_key)
                .unwrap_or_else(|| "unknown".to_string()),
            duration_min: Self::to_decimal(raw.duration, 60.0),
            avg_hr: Self::to_heart_rate(raw.average_hr),
            max_hr: Self::to_heart_rate(raw.max_hr),
            distance_km: Self::to_decimal(raw.distance, 1000.0),
            elevation_gain_m: Self::to_decimal(raw.total_elevation_gain, 1.0),
        })
    }
}

impl Default for JsonActivityImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityImporter for JsonActivityImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>, ImportError> {
        let reader = BufReader::new(File::open(file_path)?);
        let raw: Vec<PlatformActivity> = serde_json::from_reader(reader)?;

        Ok(raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, activity)| Self::convert(index, activity))
            .collect())
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}
