//! Banister impulse-response load model (Performance Management Chart)
//!
//! Turns a sparse list of daily stress observations into a dense daily series
//! of fitness (CTL), fatigue (ATL), form (TSB) and the acute:chronic workload
//! ratio. The engine is a pure function of its inputs.

use crate::models::{DailyLoadRecord, Observation};
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Lowest ratio still considered optimal
pub const OPTIMAL_RATIO_MIN: f64 = 0.8;

/// Highest ratio still considered optimal
pub const OPTIMAL_RATIO_MAX: f64 = 1.3;

/// Highest ratio classified as overreaching; anything above is high risk
pub const OVERREACHING_RATIO_MAX: f64 = 1.5;

/// Load model errors, raised before any recursion runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadModelError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("Invalid observation on {date}: stress {stress} must be finite and non-negative")]
    InvalidObservation { date: NaiveDate, stress: f64 },
    #[error("Duplicate observation for {date}")]
    DuplicateObservation { date: NaiveDate },
    #[error("Invalid time constant for {name}: must be at least one day")]
    InvalidTimeConstant { name: &'static str },
}

/// Time constants for the two exponentially weighted loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadModelConfig {
    /// Fitness (chronic) time constant in days (default: 42)
    pub fitness_time_constant: u16,

    /// Fatigue (acute) time constant in days (default: 7)
    pub fatigue_time_constant: u16,
}

impl Default for LoadModelConfig {
    fn default() -> Self {
        LoadModelConfig {
            fitness_time_constant: 42,
            fatigue_time_constant: 7,
        }
    }
}

impl LoadModelConfig {
    pub fn validate(&self) -> Result<(), LoadModelError> {
        if self.fitness_time_constant == 0 {
            return Err(LoadModelError::InvalidTimeConstant {
                name: "fitness_time_constant",
            });
        }
        if self.fatigue_time_constant == 0 {
            return Err(LoadModelError::InvalidTimeConstant {
                name: "fatigue_time_constant",
            });
        }
        Ok(())
    }
}

/// Acute:chronic workload ratio classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatioStatus {
    Undertraining, // below 0.8 or no chronic load yet
    Optimal,       // 0.8 to 1.3 inclusive
    Overreaching,  // above 1.3 up to 1.5
    HighRisk,      // above 1.5
}

impl RatioStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RatioStatus::Undertraining => "Undertraining",
            RatioStatus::Optimal => "Optimal",
            RatioStatus::Overreaching => "Overreaching",
            RatioStatus::HighRisk => "High risk",
        }
    }

    /// Get status description
    pub fn description(&self) -> &'static str {
        match self {
            RatioStatus::Undertraining => "Recent load is well below what you are adapted to",
            RatioStatus::Optimal => "Recent load matches your chronic load",
            RatioStatus::Overreaching => "Recent load is climbing faster than fitness",
            RatioStatus::HighRisk => "Load spike well above chronic load (injury risk)",
        }
    }

    /// Get training recommendation
    pub fn recommendation(&self) -> &'static str {
        match self {
            RatioStatus::Undertraining => "Build volume gradually to avoid detraining",
            RatioStatus::Optimal => "Keep progressing at the current rate",
            RatioStatus::Overreaching => "Hold volume steady and watch for fatigue",
            RatioStatus::HighRisk => "Cut intensity and schedule recovery days",
        }
    }
}

/// Classify an acute:chronic ratio against the fixed thresholds.
///
/// An undefined ratio (no chronic load yet) is treated as undertraining.
pub fn classify_ratio(acr: Option<f64>) -> RatioStatus {
    match acr {
        Some(ratio) if ratio > OVERREACHING_RATIO_MAX => RatioStatus::HighRisk,
        Some(ratio) if ratio > OPTIMAL_RATIO_MAX => RatioStatus::Overreaching,
        Some(ratio) if ratio >= OPTIMAL_RATIO_MIN => RatioStatus::Optimal,
        _ => RatioStatus::Undertraining,
    }
}

/// Form (TSB) interpretation ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormInterpretation {
    VeryFresh,    // +25 and above
    Fresh,        // +5 to +25
    Neutral,      // -10 to +5
    Fatigued,     // -30 to -10
    VeryFatigued, // Below -30
}

impl FormInterpretation {
    /// Get form interpretation from numeric value
    pub fn from_form(form: f64) -> Self {
        if form >= 25.0 {
            FormInterpretation::VeryFresh
        } else if form >= 5.0 {
            FormInterpretation::Fresh
        } else if form >= -10.0 {
            FormInterpretation::Neutral
        } else if form >= -30.0 {
            FormInterpretation::Fatigued
        } else {
            FormInterpretation::VeryFatigued
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FormInterpretation::VeryFresh => "Very fresh (may be losing fitness)",
            FormInterpretation::Fresh => "Fresh and ready for hard training/racing",
            FormInterpretation::Neutral => "Neutral (normal training)",
            FormInterpretation::Fatigued => "Fatigued (monitor closely)",
            FormInterpretation::VeryFatigued => "Very fatigued (rest needed)",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            FormInterpretation::VeryFresh => "Push volume or plan a peak performance",
            FormInterpretation::Fresh => "Good time for high-intensity sessions or racing",
            FormInterpretation::Neutral => "Continue normal training progression",
            FormInterpretation::Fatigued => "Reduce intensity, focus on recovery sessions",
            FormInterpretation::VeryFatigued => "Rest before resuming training",
        }
    }
}

/// Latest model state with its interpretations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSnapshot {
    pub record: DailyLoadRecord,
    pub ratio_status: RatioStatus,
    pub form_interpretation: FormInterpretation,
}

impl LoadSnapshot {
    pub fn from_record(record: DailyLoadRecord) -> Self {
        LoadSnapshot {
            ratio_status: classify_ratio(record.acr),
            form_interpretation: FormInterpretation::from_form(record.form),
            record,
        }
    }
}

/// One independent series computation
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub observations: Vec<Observation>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Core load model engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadModel {
    config: LoadModelConfig,
}

impl LoadModel {
    /// Create a model with the standard 42/7 day time constants
    pub fn new() -> Self {
        LoadModel::default()
    }

    pub fn with_config(config: LoadModelConfig) -> Self {
        LoadModel { config }
    }

    pub fn config(&self) -> &LoadModelConfig {
        &self.config
    }

    /// Compute the daily series for `[start, end]` inclusive.
    ///
    /// Days from the first observation (or `start`, if earlier) up to `start`
    /// are used to warm the recursion up and are not returned.
    ///
    /// Cost is linear in the days from the earliest observation to `end`:
    /// one `f64` of dense stress per day, plus one record per returned day.
    /// Warm-up days only advance the two running averages.
    pub fn compute_series(
        &self,
        observations: &[Observation],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyLoadRecord>, LoadModelError> {
        self.config.validate()?;
        if start > end {
            return Err(LoadModelError::InvalidRange { start, end });
        }

        let stress_by_date = index_observations(observations)?;
        Ok(self.run(&stress_by_date, start, end))
    }

    /// Project the record for the day after `as_of`, assuming `planned_stress` on it
    pub fn project_next_day(
        &self,
        observations: &[Observation],
        as_of: NaiveDate,
        planned_stress: f64,
    ) -> Result<DailyLoadRecord, LoadModelError> {
        self.config.validate()?;
        let next = as_of.succ_opt().ok_or(LoadModelError::InvalidRange {
            start: as_of,
            end: as_of,
        })?;
        check_stress(next, planned_stress)?;

        let mut stress_by_date = index_observations(observations)?;
        if stress_by_date.contains_key(&next) {
            return Err(LoadModelError::DuplicateObservation { date: next });
        }
        stress_by_date.insert(next, planned_stress);

        let mut projected = self.run(&stress_by_date, next, next);
        projected.pop().ok_or(LoadModelError::InvalidRange {
            start: next,
            end: next,
        })
    }

    /// Model state as of a single day
    pub fn snapshot(
        &self,
        observations: &[Observation],
        as_of: NaiveDate,
    ) -> Result<LoadSnapshot, LoadModelError> {
        let mut series = self.compute_series(observations, as_of, as_of)?;
        let record = series.pop().ok_or(LoadModelError::InvalidRange {
            start: as_of,
            end: as_of,
        })?;
        Ok(LoadSnapshot::from_record(record))
    }

    /// Run independent requests in parallel, preserving input order
    pub fn compute_many(
        &self,
        requests: &[SeriesRequest],
    ) -> Vec<Result<Vec<DailyLoadRecord>, LoadModelError>> {
        requests
            .par_iter()
            .map(|request| self.compute_series(&request.observations, request.start, request.end))
            .collect()
    }

    /// Integrate validated stress from the warm-up origin through `end`, returning `[start, end]`
    fn run(
        &self,
        stress_by_date: &BTreeMap<NaiveDate, f64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<DailyLoadRecord> {
        let origin = stress_by_date
            .keys()
            .next()
            .map_or(start, |first| (*first).min(start));

        let day_count = (end - origin).num_days() + 1;
        let stress: Vec<f64> = (0..day_count)
            .map(|offset| {
                let date = origin + Duration::days(offset);
                stress_by_date.get(&date).copied().unwrap_or(0.0)
            })
            .collect();

        let warmup_days = (start - origin).num_days() as usize;
        debug!(
            %origin,
            %start,
            %end,
            warmup_days,
            observations = stress_by_date.len(),
            "Computing load series"
        );

        self.integrate(origin, &stress, warmup_days)
    }

    /// Single left-to-right pass over dense daily stress starting at `origin`,
    /// keeping records from index `first_kept` on
    fn integrate(
        &self,
        origin: NaiveDate,
        stress: &[f64],
        first_kept: usize,
    ) -> Vec<DailyLoadRecord> {
        let fitness_tc = f64::from(self.config.fitness_time_constant);
        let fatigue_tc = f64::from(self.config.fatigue_time_constant);
        let acute_window = usize::from(self.config.fatigue_time_constant);
        let chronic_window = usize::from(self.config.fitness_time_constant);

        let mut fitness = 0.0;
        let mut fatigue = 0.0;
        let mut records = Vec::with_capacity(stress.len().saturating_sub(first_kept));

        for (index, &day_stress) in stress.iter().enumerate() {
            // EWMA with smoothing factor 1/time_constant
            fitness += (day_stress - fitness) / fitness_tc;
            fatigue += (day_stress - fatigue) / fatigue_tc;
            if index < first_kept {
                continue;
            }

            let acute = trailing_mean(stress, index, acute_window);
            let chronic = trailing_mean(stress, index, chronic_window);
            let acr = if chronic > 0.0 {
                Some(acute / chronic)
            } else {
                None
            };

            records.push(DailyLoadRecord {
                date: origin + Duration::days(index as i64),
                stress: day_stress,
                fitness,
                fatigue,
                form: fitness - fatigue,
                acr,
            });
        }

        records
    }
}

/// Compute a series with the default 42/7 day time constants
pub fn compute_series(
    observations: &[Observation],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyLoadRecord>, LoadModelError> {
    LoadModel::new().compute_series(observations, start, end)
}

fn check_stress(date: NaiveDate, stress: f64) -> Result<(), LoadModelError> {
    if !stress.is_finite() || stress < 0.0 {
        return Err(LoadModelError::InvalidObservation { date, stress });
    }
    Ok(())
}

/// Validate observations and index them by date
fn index_observations(
    observations: &[Observation],
) -> Result<BTreeMap<NaiveDate, f64>, LoadModelError> {
    let mut stress_by_date = BTreeMap::new();

    for observation in observations {
        check_stress(observation.date, observation.stress)?;
        if stress_by_date
            .insert(observation.date, observation.stress)
            .is_some()
        {
            return Err(LoadModelError::DuplicateObservation {
                date: observation.date,
            });
        }
    }

    Ok(stress_by_date)
}

/// Mean of the `window` days ending at `end_index`; days before the series start count as zero
fn trailing_mean(stress: &[f64], end_index: usize, window: usize) -> f64 {
    let begin = (end_index + 1).saturating_sub(window);
    stress[begin..=end_index].iter().sum::<f64>() / window as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn approx(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn test_single_observation_scenario() {
        let observations = vec![Observation::new(date(2026, 1, 1), 50.0)];
        let series = compute_series(&observations, date(2026, 1, 1), date(2026, 1, 3)).unwrap();

        assert_eq!(series.len(), 3);
        assert!(approx(series[0].fitness, 50.0 / 42.0, 1e-9));
        assert!(approx(series[0].fatigue, 50.0 / 7.0, 1e-9));
        assert!(approx(series[0].form, -5.952, 1e-3));

        // Rest days: both loads decay, form climbs back toward zero
        for pair in series.windows(2) {
            assert!(pair[1].fitness < pair[0].fitness);
            assert!(pair[1].fatigue < pair[0].fatigue);
            assert!(pair[1].form > pair[0].form);
            assert!(pair[1].form < 0.0);
        }
        assert!(approx(series[1].fitness, 50.0 / 42.0 * 41.0 / 42.0, 1e-9));
        assert!(approx(series[1].fatigue, 50.0 / 7.0 * 6.0 / 7.0, 1e-9));
    }

    #[test]
    fn test_form_is_fitness_minus_fatigue() {
        let observations: Vec<Observation> = (0..60)
            .map(|i| Observation::new(date(2025, 11, 1) + Duration::days(i), (i * 7 % 120) as f64))
            .collect();
        let series = compute_series(&observations, date(2025, 11, 20), date(2026, 1, 15)).unwrap();

        for record in &series {
            assert_eq!(record.form, record.fitness - record.fatigue);
        }
    }

    #[test]
    fn test_all_zero_stress() {
        let observations: Vec<Observation> = (0..10)
            .map(|i| Observation::new(date(2026, 2, 1) + Duration::days(i), 0.0))
            .collect();
        let series = compute_series(&observations, date(2026, 2, 1), date(2026, 2, 20)).unwrap();

        for record in &series {
            assert_eq!(record.fitness, 0.0);
            assert_eq!(record.fatigue, 0.0);
            assert_eq!(record.form, 0.0);
            assert_eq!(record.acr, None);
        }
    }

    #[test]
    fn test_single_spike_decay() {
        let spike_day = date(2026, 4, 10);
        let observations = vec![Observation::new(spike_day, 120.0)];
        let series = compute_series(&observations, date(2026, 4, 1), date(2026, 5, 10)).unwrap();

        let spike_index = series.iter().position(|r| r.date == spike_day).unwrap();
        assert_eq!(series[spike_index - 1].fitness, 0.0);
        assert!(series[spike_index].fitness > 0.0);
        assert!(series[spike_index].fatigue > series[spike_index].fitness);

        for pair in series[spike_index..].windows(2) {
            assert!(pair[1].fitness < pair[0].fitness);
            assert!(pair[1].fatigue < pair[0].fatigue);

            let fitness_retained = pair[1].fitness / pair[0].fitness;
            let fatigue_retained = pair[1].fatigue / pair[0].fatigue;
            assert!(fatigue_retained < fitness_retained);
        }
    }

    #[test]
    fn test_output_length_and_contiguity() {
        let observations = vec![Observation::new(date(2024, 1, 15), 80.0)];
        let start = date(2024, 2, 20);
        let end = date(2024, 3, 5); // spans the leap day

        let series = compute_series(&observations, start, end).unwrap();
        assert_eq!(series.len() as i64, (end - start).num_days() + 1);
        assert_eq!(series.first().unwrap().date, start);
        assert_eq!(series.last().unwrap().date, end);
        for pair in series.windows(2) {
            assert_eq!(pair[1].date, pair[0].date.succ_opt().unwrap());
        }
    }

    #[test]
    fn test_single_day_range() {
        let series = compute_series(&[], date(2026, 6, 1), date(2026, 6, 1)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].fitness, 0.0);
    }

    #[test]
    fn test_invalid_range() {
        let result = compute_series(&[], date(2026, 3, 10), date(2026, 3, 1));
        assert_eq!(
            result,
            Err(LoadModelError::InvalidRange {
                start: date(2026, 3, 10),
                end: date(2026, 3, 1),
            })
        );
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let observations = vec![
            Observation::new(date(2026, 3, 1), 40.0),
            Observation::new(date(2026, 2, 27), 10.0),
            Observation::new(date(2026, 3, 1), 65.0),
        ];
        let result = compute_series(&observations, date(2026, 3, 1), date(2026, 3, 7));
        assert_eq!(
            result,
            Err(LoadModelError::DuplicateObservation {
                date: date(2026, 3, 1)
            })
        );
    }

    #[test]
    fn test_invalid_stress_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let observations = vec![Observation::new(date(2026, 1, 5), bad)];
            let result = compute_series(&observations, date(2026, 1, 1), date(2026, 1, 10));
            assert!(matches!(
                result,
                Err(LoadModelError::InvalidObservation { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_observation_outside_range_still_rejected() {
        let observations = vec![Observation::new(date(2027, 1, 1), -5.0)];
        let result = compute_series(&observations, date(2026, 1, 1), date(2026, 1, 10));
        assert!(matches!(
            result,
            Err(LoadModelError::InvalidObservation { .. })
        ));
    }

    #[test]
    fn test_unsorted_input_matches_sorted() {
        let sorted = vec![
            Observation::new(date(2026, 1, 1), 30.0),
            Observation::new(date(2026, 1, 3), 90.0),
            Observation::new(date(2026, 1, 8), 45.0),
        ];
        let mut shuffled = sorted.clone();
        shuffled.reverse();

        let a = compute_series(&sorted, date(2026, 1, 1), date(2026, 1, 14)).unwrap();
        let b = compute_series(&shuffled, date(2026, 1, 1), date(2026, 1, 14)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_history_before_start_warms_up() {
        let observations: Vec<Observation> = (0..30)
            .map(|i| Observation::new(date(2026, 1, 1) + Duration::days(i), 60.0))
            .collect();

        let full = compute_series(&observations, date(2026, 1, 1), date(2026, 2, 15)).unwrap();
        let visible = compute_series(&observations, date(2026, 2, 1), date(2026, 2, 15)).unwrap();

        assert!(visible[0].fitness > 0.0);
        assert_eq!(visible[..], full[full.len() - visible.len()..]);
    }

    #[test]
    fn test_distant_history_returns_only_requested_days() {
        let observations = vec![Observation::new(date(2006, 3, 1), 100.0)];

        let full = compute_series(&observations, date(2006, 3, 1), date(2026, 3, 3)).unwrap();
        let tail = compute_series(&observations, date(2026, 3, 1), date(2026, 3, 3)).unwrap();

        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].date, date(2026, 3, 1));
        assert_eq!(tail[..], full[full.len() - 3..]);
        assert_eq!(tail[0].acr, None);
        assert!(tail[0].fitness >= 0.0 && tail[0].fitness < 1e-30);
    }

    #[test]
    fn test_observations_after_end_ignored() {
        let base = vec![Observation::new(date(2026, 1, 2), 70.0)];
        let mut with_future = base.clone();
        with_future.push(Observation::new(date(2026, 3, 1), 200.0));

        let a = compute_series(&base, date(2026, 1, 1), date(2026, 1, 31)).unwrap();
        let b = compute_series(&with_future, date(2026, 1, 1), date(2026, 1, 31)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_workload_ratio_uses_rolling_means() {
        let observations: Vec<Observation> = (0..42)
            .map(|i| Observation::new(date(2026, 1, 1) + Duration::days(i), 100.0))
            .collect();
        let series = compute_series(&observations, date(2025, 12, 30), date(2026, 2, 11)).unwrap();

        // No stress yet on the first two days
        assert_eq!(series[0].acr, None);
        assert_eq!(series[1].acr, None);

        // First training day: acute = 100/7, chronic = 100/42
        assert!(approx(series[2].acr.unwrap(), 6.0, 1e-9));

        // After 42 consecutive days both windows are full
        let full = series.iter().find(|r| r.date == date(2026, 2, 11)).unwrap();
        assert!(approx(full.acr.unwrap(), 1.0, 1e-9));
    }

    #[test]
    fn test_ratio_drops_after_rest() {
        let observations: Vec<Observation> = (0..42)
            .map(|i| Observation::new(date(2026, 1, 1) + Duration::days(i), 100.0))
            .collect();
        let series = compute_series(&observations, date(2026, 2, 12), date(2026, 2, 18)).unwrap();

        // A full week of rest empties the acute window but not the chronic one
        let last = series.last().unwrap();
        assert_eq!(last.acr, Some(0.0));
        assert_eq!(classify_ratio(last.acr), RatioStatus::Undertraining);
    }

    #[test]
    fn test_classify_ratio_boundaries() {
        assert_eq!(classify_ratio(Some(0.8)), RatioStatus::Optimal);
        assert_eq!(classify_ratio(Some(0.79999)), RatioStatus::Undertraining);
        assert_eq!(classify_ratio(Some(1.3)), RatioStatus::Optimal);
        assert_eq!(classify_ratio(Some(1.30001)), RatioStatus::Overreaching);
        assert_eq!(classify_ratio(Some(1.5)), RatioStatus::Overreaching);
        assert_eq!(classify_ratio(Some(1.50001)), RatioStatus::HighRisk);
        assert_eq!(classify_ratio(None), RatioStatus::Undertraining);
        assert_eq!(classify_ratio(Some(f64::NAN)), RatioStatus::Undertraining);
    }

    #[test]
    fn test_zero_time_constant_rejected() {
        let model = LoadModel::with_config(LoadModelConfig {
            fitness_time_constant: 42,
            fatigue_time_constant: 0,
        });
        let result = model.compute_series(&[], date(2026, 1, 1), date(2026, 1, 2));
        assert_eq!(
            result,
            Err(LoadModelError::InvalidTimeConstant {
                name: "fatigue_time_constant"
            })
        );
    }

    #[test]
    fn test_custom_config() {
        let model = LoadModel::with_config(LoadModelConfig {
            fitness_time_constant: 28,
            fatigue_time_constant: 5,
        });
        let observations = vec![Observation::new(date(2026, 1, 1), 100.0)];
        let series = model
            .compute_series(&observations, date(2026, 1, 1), date(2026, 1, 1))
            .unwrap();

        assert!(approx(series[0].fitness, 100.0 / 28.0, 1e-9));
        assert!(approx(series[0].fatigue, 20.0, 1e-9));
    }

    #[test]
    fn test_project_next_day() {
        let model = LoadModel::new();
        let observations = vec![
            Observation::new(date(2026, 1, 1), 50.0),
            Observation::new(date(2026, 1, 3), 80.0),
        ];

        let projected = model
            .project_next_day(&observations, date(2026, 1, 5), 60.0)
            .unwrap();

        let mut extended = observations.clone();
        extended.push(Observation::new(date(2026, 1, 6), 60.0));
        let expected = model
            .compute_series(&extended, date(2026, 1, 6), date(2026, 1, 6))
            .unwrap();

        assert_eq!(projected, expected[0]);
        assert_eq!(projected.date, date(2026, 1, 6));
    }

    #[test]
    fn test_project_next_day_rejects_existing_day() {
        let model = LoadModel::new();
        let observations = vec![Observation::new(date(2026, 1, 6), 50.0)];
        let result = model.project_next_day(&observations, date(2026, 1, 5), 60.0);
        assert_eq!(
            result,
            Err(LoadModelError::DuplicateObservation {
                date: date(2026, 1, 6)
            })
        );

        let result = model.project_next_day(&[], date(2026, 1, 5), -1.0);
        assert!(matches!(
            result,
            Err(LoadModelError::InvalidObservation { .. })
        ));
    }

    #[test]
    fn test_snapshot() {
        let observations: Vec<Observation> = (0..10)
            .map(|i| Observation::new(date(2026, 1, 1) + Duration::days(i), 150.0))
            .collect();
        let snapshot = LoadModel::new()
            .snapshot(&observations, date(2026, 1, 10))
            .unwrap();

        assert_eq!(snapshot.record.date, date(2026, 1, 10));
        assert!(snapshot.record.form < -30.0);
        assert_eq!(
            snapshot.form_interpretation,
            FormInterpretation::VeryFatigued
        );
        assert_eq!(snapshot.ratio_status, RatioStatus::HighRisk);
    }

    #[test]
    fn test_compute_many_preserves_order() {
        let requests = vec![
            SeriesRequest {
                observations: vec![Observation::new(date(2026, 1, 1), 40.0)],
                start: date(2026, 1, 1),
                end: date(2026, 1, 5),
            },
            SeriesRequest {
                observations: vec![],
                start: date(2026, 1, 5),
                end: date(2026, 1, 1),
            },
            SeriesRequest {
                observations: vec![Observation::new(date(2026, 2, 1), 90.0)],
                start: date(2026, 2, 1),
                end: date(2026, 2, 28),
            },
        ];

        let results = LoadModel::new().compute_many(&requests);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().len(), 5);
        assert!(matches!(
            results[1],
            Err(LoadModelError::InvalidRange { .. })
        ));
        assert_eq!(results[2].as_ref().unwrap().len(), 28);
    }

    #[test]
    fn test_form_interpretation() {
        assert_eq!(
            FormInterpretation::from_form(30.0),
            FormInterpretation::VeryFresh
        );
        assert_eq!(FormInterpretation::from_form(10.0), FormInterpretation::Fresh);
        assert_eq!(FormInterpretation::from_form(0.0), FormInterpretation::Neutral);
        assert_eq!(
            FormInterpretation::from_form(-20.0),
            FormInterpretation::Fatigued
        );
        assert_eq!(
            FormInterpretation::from_form(-40.0),
            FormInterpretation::VeryFatigued
        );
    }

    use proptest::prelude::*;

    fn observations_from(days: &BTreeMap<i64, f64>) -> Vec<Observation> {
        let base = date(2025, 1, 1);
        days.iter()
            .map(|(&offset, &stress)| Observation::new(base + Duration::days(offset), stress))
            .collect()
    }

    proptest! {
        #[test]
        fn test_series_properties(
            days in prop::collection::btree_map(0i64..200, 0.0f64..400.0, 0..60),
            start_offset in 0i64..150,
            span in 0i64..120
        ) {
            let observations = observations_from(&days);
            let start = date(2025, 1, 1) + Duration::days(start_offset);
            let end = start + Duration::days(span);
            let max_stress = days.values().cloned().fold(0.0, f64::max);

            let series = compute_series(&observations, start, end).unwrap();

            prop_assert_eq!(series.len() as i64, span + 1);
            prop_assert_eq!(series[0].date, start);
            for record in &series {
                prop_assert!(record.fitness >= 0.0 && record.fitness <= max_stress + 1e-9);
                prop_assert!(record.fatigue >= 0.0 && record.fatigue <= max_stress + 1e-9);
                prop_assert!((record.form - (record.fitness - record.fatigue)).abs() < 1e-9);
                if let Some(acr) = record.acr {
                    prop_assert!(acr >= 0.0 && acr.is_finite());
                }
            }
        }

        #[test]
        fn test_input_order_does_not_matter(
            days in prop::collection::btree_map(0i64..90, 0.0f64..250.0, 1..30)
        ) {
            let observations = observations_from(&days);
            let mut reversed = observations.clone();
            reversed.reverse();

            let start = date(2025, 2, 1);
            let end = date(2025, 4, 30);
            prop_assert_eq!(
                compute_series(&observations, start, end).unwrap(),
                compute_series(&reversed, start, end).unwrap()
            );
        }
    }
}
