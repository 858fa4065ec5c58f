use crate::models::{Activity, Observation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Stress scoring errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StressError {
    #[error("Invalid heart rate profile: {0}")]
    InvalidProfile(String),
}

/// Heart rate anchors used for heart-rate-reserve scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateProfile {
    /// Resting heart rate in bpm
    pub resting_hr: u16,

    /// Maximum heart rate in bpm
    pub max_hr: u16,
}

impl Default for HeartRateProfile {
    fn default() -> Self {
        HeartRateProfile {
            resting_hr: 45,
            max_hr: 197,
        }
    }
}

impl HeartRateProfile {
    pub fn new(resting_hr: u16, max_hr: u16) -> Result<Self, StressError> {
        let profile = HeartRateProfile { resting_hr, max_hr };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), StressError> {
        if self.resting_hr == 0 {
            return Err(StressError::InvalidProfile(
                "resting heart rate must be positive".to_string(),
            ));
        }
        if self.max_hr <= self.resting_hr {
            return Err(StressError::InvalidProfile(format!(
                "max heart rate {} must exceed resting heart rate {}",
                self.max_hr, self.resting_hr
            )));
        }
        Ok(())
    }

    /// Heart rate reserve (max - resting)
    pub fn reserve(&self) -> u16 {
        self.max_hr.saturating_sub(self.resting_hr)
    }

    /// Fraction of heart rate reserve used at `avg_hr`, floored at zero
    pub fn reserve_fraction(&self, avg_hr: u16) -> f64 {
        let reserve = f64::from(self.reserve());
        if reserve == 0.0 {
            return 0.0;
        }
        ((f64::from(avg_hr) - f64::from(self.resting_hr)) / reserve).max(0.0)
    }
}

/// Banister TRIMP weighting coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimpWeighting {
    /// k = 0.64, b = 1.92
    #[default]
    Male,
    /// k = 0.86, b = 1.67
    Female,
}

impl TrimpWeighting {
    fn coefficients(&self) -> (f64, f64) {
        match self {
            TrimpWeighting::Male => (0.64, 1.92),
            TrimpWeighting::Female => (0.86, 1.67),
        }
    }
}

/// Scores activities and folds them into one observation per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StressScorer {
    profile: HeartRateProfile,
    weighting: TrimpWeighting,
}

impl StressScorer {
    pub fn new(profile: HeartRateProfile, weighting: TrimpWeighting) -> Result<Self, StressError> {
        profile.validate()?;
        Ok(StressScorer { profile, weighting })
    }

    pub fn profile(&self) -> &HeartRateProfile {
        &self.profile
    }

    /// Banister TRIMP: duration × HRr × k × e^(b × HRr)
    pub fn trimp(&self, duration_min: f64, avg_hr: u16) -> f64 {
        if avg_hr == 0 || !duration_min.is_finite() || duration_min <= 0.0 {
            return 0.0;
        }

        let hrr = self.profile.reserve_fraction(avg_hr);
        let (k, b) = self.weighting.coefficients();
        duration_min * hrr * k * (b * hrr).exp()
    }

    /// Score a single activity
    pub fn score_activity(&self, activity: &Activity) -> f64 {
        self.trimp(activity.duration_minutes_f64(), activity.avg_hr)
    }

    /// Sum scored activities per calendar day, ascending by date
    pub fn daily_observations(&self, activities: &[Activity]) -> Vec<Observation> {
        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for activity in activities {
            *daily.entry(activity.date).or_insert(0.0) += self.score_activity(activity);
        }

        debug!(
            activities = activities.len(),
            days = daily.len(),
            "Aggregated daily stress"
        );

        daily
            .into_iter()
            .map(|(date, stress)| Observation::new(date, stress))
            .collect()
    }
}
