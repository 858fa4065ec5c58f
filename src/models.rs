use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One day's aggregate training stress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar day the stress was accumulated on
    pub date: NaiveDate,

    /// Summed stress score for the day (zero for rest days)
    pub stress: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, stress: f64) -> Self {
        Observation { date, stress }
    }
}

/// Fitness, fatigue and form for a single calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyLoadRecord {
    /// Date these values describe
    pub date: NaiveDate,

    /// Stress used for this day (zero when nothing was recorded)
    pub stress: f64,

    /// Long time-constant exponentially weighted load (CTL)
    pub fitness: f64,

    /// Short time-constant exponentially weighted load (ATL)
    pub fatigue: f64,

    /// Fitness minus fatigue (TSB)
    pub form: f64,

    /// Acute:chronic workload ratio, absent while the chronic average is zero
    pub acr: Option<f64>,
}

/// Raw activity as delivered by an activity source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Identifier assigned by the source platform
    pub id: String,

    /// Local start date of the activity
    pub date: NaiveDate,

    /// Activity type key as reported by the source (e.g. "treadmill_running")
    pub activity_type: String,

    /// Moving duration in minutes
    pub duration_min: Decimal,

    /// Average heart rate, zero when the activity had no HR data
    pub avg_hr: u16,

    /// Maximum heart rate, zero when unknown
    pub max_hr: u16,

    /// Distance in kilometres
    pub distance_km: Decimal,

    /// Total elevation gain in metres
    pub elevation_gain_m: Decimal,
}

impl Activity {
    /// Collapse running variants ("trail_running", "treadmill_running") into "running"
    pub fn normalized_type(&self) -> String {
        let lower = self.activity_type.to_lowercase();
        if lower.contains("running") {
            "running".to_string()
        } else {
            lower
        }
    }

    /// Duration as a float for physiological formulas
    pub fn duration_minutes_f64(&self) -> f64 {
        self.duration_min.to_f64().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn activity(activity_type: &str) -> Activity {
        Activity {
            id: "1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(),
            activity_type: activity_type.to_string(),
            duration_min: dec!(45.5),
            avg_hr: 150,
            max_hr: 172,
            distance_km: dec!(8.2),
            elevation_gain_m: dec!(40),
        }
    }

    #[test]
    fn test_running_variants_normalize() {
        assert_eq!(activity("treadmill_running").normalized_type(), "running");
        assert_eq!(activity("Trail_Running").normalized_type(), "running");
        assert_eq!(activity("Strength_Training").normalized_type(), "strength_training");
    }

    #[test]
    fn test_duration_conversion() {
        assert!((activity("cycling").duration_minutes_f64() - 45.5).abs() < 1e-9);
    }
}
