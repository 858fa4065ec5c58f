//! Activity volume summaries
//!
//! Groups raw activities by sport category, buckets their volume into daily
//! or weekly periods over a lookback window, and totals a calendar year
//! against the yearly project targets.

use crate::models::Activity;
use crate::windows::LookbackWindow;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Shortest run counted as a half marathon (21.09 km)
pub const HALF_MARATHON_KM: Decimal = Decimal::from_parts(2109, 0, 0, false, 2);

/// Sport category used to filter activities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    #[default]
    All,
    Running,
    Strength,
    WalkingHiking,
    Other,
}

impl ActivityCategory {
    pub fn matches(&self, activity: &Activity) -> bool {
        let kind = activity.normalized_type();
        let running = kind == "running";
        let strength = kind.contains("strength");
        let walking = kind.contains("walking") || kind.contains("hiking");

        match self {
            ActivityCategory::All => true,
            ActivityCategory::Running => running,
            ActivityCategory::Strength => strength,
            ActivityCategory::WalkingHiking => walking,
            ActivityCategory::Other => !(running || strength || walking),
        }
    }

    /// Distance for on-foot categories, time for everything else
    pub fn unit(&self) -> VolumeUnit {
        match self {
            ActivityCategory::All | ActivityCategory::Running | ActivityCategory::WalkingHiking => {
                VolumeUnit::Kilometres
            }
            ActivityCategory::Strength | ActivityCategory::Other => VolumeUnit::Hours,
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityCategory::All => "All",
            ActivityCategory::Running => "Running",
            ActivityCategory::Strength => "Strength Training",
            ActivityCategory::WalkingHiking => "Walking/Hiking",
            ActivityCategory::Other => "Other",
        };
        f.write_str(label)
    }
}

impl FromStr for ActivityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "all" => Ok(ActivityCategory::All),
            "running" | "run" => Ok(ActivityCategory::Running),
            "strength" | "strength training" => Ok(ActivityCategory::Strength),
            "walking" | "hiking" | "walking/hiking" | "walking hiking" => {
                Ok(ActivityCategory::WalkingHiking)
            }
            "other" => Ok(ActivityCategory::Other),
            _ => Err(format!("Invalid activity category: {}", s)),
        }
    }
}

/// What a volume figure measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeUnit {
    Kilometres,
    Hours,
}

impl VolumeUnit {
    fn measure(&self, activity: &Activity) -> Decimal {
        match self {
            VolumeUnit::Kilometres => activity.distance_km,
            VolumeUnit::Hours => activity.duration_min / Decimal::from(60),
        }
    }

    /// "12.3 km" or "1h 05m"
    pub fn format(&self, value: Decimal) -> String {
        let value = value.to_f64().unwrap_or(0.0);
        match self {
            VolumeUnit::Kilometres => format!("{:.1} km", value),
            VolumeUnit::Hours => format_duration(value * 60.0),
        }
    }
}

/// Whole minutes as "45m" or "2h 05m"
pub fn format_duration(minutes: f64) -> String {
    let total = minutes.max(0.0) as u64;
    if total < 60 {
        format!("{}m", total)
    } else {
        format!("{}h {:02}m", total / 60, total % 60)
    }
}

/// Bucket size for a volume trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    /// Weeks starting on Monday
    Weekly,
}

impl Granularity {
    pub fn for_window(window: LookbackWindow) -> Self {
        if window.is_short() {
            Granularity::Daily
        } else {
            Granularity::Weekly
        }
    }

    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => date
                .checked_sub_signed(Duration::days(i64::from(
                    date.weekday().num_days_from_monday(),
                )))
                .unwrap_or(date),
        }
    }
}

/// Volume accumulated in one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodVolume {
    pub period_start: NaiveDate,
    pub activities: usize,
    pub volume: Decimal,
}

/// Per-period volume for one category over a lookback window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeTrend {
    pub window: String,
    pub category: ActivityCategory,
    pub granularity: Granularity,
    pub unit: VolumeUnit,
    pub start: NaiveDate,
    pub end: NaiveDate,

    /// Only periods with at least one matching activity, oldest first
    pub periods: Vec<PeriodVolume>,
}

impl VolumeTrend {
    pub fn total(&self) -> Decimal {
        self.periods.iter().map(|period| period.volume).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Bucket matching activities in `window` (ending on `today`) by period
pub fn volume_trend(
    activities: &[Activity],
    category: ActivityCategory,
    window: LookbackWindow,
    today: NaiveDate,
) -> VolumeTrend {
    let (start, end) = window.range(today);
    let granularity = Granularity::for_window(window);
    let unit = category.unit();

    let mut buckets: BTreeMap<NaiveDate, PeriodVolume> = BTreeMap::new();
    for activity in activities
        .iter()
        .filter(|a| a.date >= start && a.date <= end && category.matches(a))
    {
        let period_start = granularity.period_start(activity.date);
        let bucket = buckets.entry(period_start).or_insert_with(|| PeriodVolume {
            period_start,
            activities: 0,
            volume: Decimal::ZERO,
        });
        bucket.activities += 1;
        bucket.volume += unit.measure(activity);
    }

    debug!(
        %window,
        %category,
        ?granularity,
        periods = buckets.len(),
        "Computed volume trend"
    );

    VolumeTrend {
        window: window.to_string(),
        category,
        granularity,
        unit,
        start,
        end,
        periods: buckets.into_values().collect(),
    }
}

/// Yearly project targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectTargets {
    /// Calendar year the targets apply to
    pub year: i32,
    pub running_km: f64,
    pub half_marathons: u32,
    pub active_days: u32,
    pub strength_sessions: u32,
}

impl Default for ProjectTargets {
    fn default() -> Self {
        ProjectTargets {
            year: 2026,
            running_km: 2026.0,
            half_marathons: 26,
            active_days: 200,
            strength_sessions: 104,
        }
    }
}

/// Totals for one calendar year across every category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotals {
    pub year: i32,
    pub activities: usize,
    pub running_km: Decimal,
    pub half_marathons: usize,
    pub active_days: usize,
    pub strength_sessions: usize,
    pub elevation_gain_m: Decimal,

    /// Highest recorded heart rate, if any activity carried one
    pub peak_hr: Option<u16>,
}

impl YearTotals {
    pub fn for_year(activities: &[Activity], year: i32) -> Self {
        let mut totals = YearTotals {
            year,
            activities: 0,
            running_km: Decimal::ZERO,
            half_marathons: 0,
            active_days: 0,
            strength_sessions: 0,
            elevation_gain_m: Decimal::ZERO,
            peak_hr: None,
        };
        let mut days = BTreeSet::new();

        for activity in activities.iter().filter(|a| a.date.year() == year) {
            totals.activities += 1;
            days.insert(activity.date);
            totals.elevation_gain_m += activity.elevation_gain_m;

            if ActivityCategory::Running.matches(activity) {
                totals.running_km += activity.distance_km;
                if activity.distance_km >= HALF_MARATHON_KM {
                    totals.half_marathons += 1;
                }
            }
            if ActivityCategory::Strength.matches(activity) {
                totals.strength_sessions += 1;
            }
            if activity.max_hr > 0 {
                totals.peak_hr = totals.peak_hr.max(Some(activity.max_hr));
            }
        }

        totals.active_days = days.len();
        totals
    }

    /// Progress against `targets`, or `None` when they are for another year
    pub fn progress(&self, targets: &ProjectTargets) -> Option<Vec<GoalProgress>> {
        if targets.year != self.year {
            return None;
        }

        Some(vec![
            GoalProgress::new(
                "Running Distance",
                self.running_km.to_f64().unwrap_or(0.0),
                targets.running_km,
            ),
            GoalProgress::new(
                "Half Marathons",
                self.half_marathons as f64,
                f64::from(targets.half_marathons),
            ),
            GoalProgress::new(
                "Active Days",
                self.active_days as f64,
                f64::from(targets.active_days),
            ),
            GoalProgress::new(
                "Strength Sessions",
                self.strength_sessions as f64,
                f64::from(targets.strength_sessions),
            ),
        ])
    }
}

/// One goal's actual value against its target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: &'static str,
    pub actual: f64,
    pub target: f64,
}

impl GoalProgress {
    pub fn new(goal: &'static str, actual: f64, target: f64) -> Self {
        GoalProgress {
            goal,
            actual,
            target,
        }
    }

    /// Completed fraction clamped to `[0, 1]`; zero for a non-positive target
    pub fn fraction(&self) -> f64 {
        if self.target > 0.0 {
            (self.actual / self.target).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Everything the `summary` command reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub totals: YearTotals,
    pub progress: Option<Vec<GoalProgress>>,
    pub trend: VolumeTrend,
}

impl ActivitySummary {
    pub fn build(
        activities: &[Activity],
        year: i32,
        targets: &ProjectTargets,
        category: ActivityCategory,
        window: LookbackWindow,
        today: NaiveDate,
    ) -> Self {
        let totals = YearTotals::for_year(activities, year);
        let progress = totals.progress(targets);
        ActivitySummary {
            totals,
            progress,
            trend: volume_trend(activities, category, window, today),
        }
    }
}
