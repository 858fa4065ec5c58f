//! Coaching advice on top of the load model
//!
//! An [`AdviceContext`] captures the latest model state plus the athlete's
//! goals and notes. Providers turn a context into advice text; the
//! [`AdviceCoach`] walks a list of models, caches successes by context
//! fingerprint and maps provider failures to a single outcome.

use crate::load_model::LoadSnapshot;
use crate::models::DailyLoadRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

pub mod backoff;
pub mod cache;
pub mod coach;
pub mod rules;

pub use backoff::{retry_with_backoff, BackoffPolicy};
pub use cache::{AdviceCache, CacheMetrics, CachedAdvice};
pub use coach::AdviceCoach;
pub use rules::RuleBasedProvider;

/// Number of trailing days of form included in the context
pub const DEFAULT_FORM_HISTORY_DAYS: usize = 7;

/// Advice generation errors
#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("Rate limit reached for model {model}")]
    RateLimited {
        model: String,
        retry_after: Option<Duration>,
    },

    #[error("Model {model} failed: {message}")]
    Provider { model: String, message: String },

    #[error("All advice models failed ({})", .attempted.join(", "))]
    AllModelsFailed { attempted: Vec<String> },

    #[error("No advice models configured")]
    NotConfigured,

    #[error("No load history to advise on")]
    EmptyHistory,

    #[error("Advice cache IO error: {0}")]
    CacheIo(#[from] std::io::Error),

    #[error("Advice cache format error: {0}")]
    CacheFormat(#[from] serde_json::Error),
}

impl AdviceError {
    /// Rate limits clear on their own; everything else needs a change first
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdviceError::RateLimited { .. })
    }

    /// Provider-suggested wait before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AdviceError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Everything a provider needs to write advice for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceContext {
    pub snapshot: LoadSnapshot,
    /// Form values for the trailing days, oldest first, ending at the snapshot
    pub recent_forms: Vec<f64>,
    pub goals: Option<String>,
    pub user_context: Option<String>,
}

impl AdviceContext {
    /// Build from a computed series; `None` when the series is empty
    pub fn from_series(
        series: &[DailyLoadRecord],
        goals: Option<String>,
        user_context: Option<String>,
    ) -> Option<Self> {
        let latest = *series.last()?;
        let history_start = series.len().saturating_sub(DEFAULT_FORM_HISTORY_DAYS);

        Some(AdviceContext {
            snapshot: LoadSnapshot::from_record(latest),
            recent_forms: series[history_start..].iter().map(|r| r.form).collect(),
            goals: goals.filter(|g| !g.trim().is_empty()),
            user_context: user_context.filter(|c| !c.trim().is_empty()),
        })
    }

    /// Render the coaching prompt sent to remote models
    pub fn prompt(&self) -> String {
        let record = &self.snapshot.record;
        let ratio = record
            .acr
            .map(|acr| format!("{:.2}", acr))
            .unwrap_or_else(|| "n/a".to_string());
        let history = self
            .recent_forms
            .iter()
            .map(|form| format!("{:.1}", form))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Act as an elite endurance coach.\n\
             GOALS: {goals}\n\
             ATHLETE NOTES: {notes}\n\
             CURRENT STATUS ({date}): fitness {fitness:.1}, fatigue {fatigue:.1}, form {form:.1}, \
             workload ratio {ratio} ({status}).\n\
             FORM, LAST {days} DAYS: {history}\n\n\
             TASK: Reply in 3-4 sentences total, structured as:\n\
             1. Short term: specific focus for today and tomorrow based on form and fatigue.\n\
             2. Long term: how this fits the goals.\n\
             If form is very negative, mandate rest. If form is high, push for volume.",
            goals = self.goals.as_deref().unwrap_or("None"),
            notes = self.user_context.as_deref().unwrap_or("None"),
            date = record.date.format("%Y-%m-%d"),
            fitness = record.fitness,
            fatigue = record.fatigue,
            form = record.form,
            ratio = ratio,
            status = self.snapshot.ratio_status.label(),
            days = self.recent_forms.len(),
            history = history,
        )
    }

    /// Cache key: changes whenever the advice inputs change meaningfully
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{:.2}", self.snapshot.record.form).as_bytes());
        hasher.update(b"|");
        for form in &self.recent_forms {
            hasher.update(format!("{:.2},", form).as_bytes());
        }
        hasher.update(b"|");
        hasher.update(self.goals.as_deref().unwrap_or("").trim().as_bytes());
        hasher.update(b"|");
        hasher.update(self.user_context.as_deref().unwrap_or("").trim().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A source of advice text, such as a hosted language model
pub trait AdviceProvider {
    /// Generate advice for the context using the named model
    fn generate(&self, model: &str, context: &AdviceContext) -> Result<String, AdviceError>;
}

impl<P: AdviceProvider + ?Sized> AdviceProvider for &P {
    fn generate(&self, model: &str, context: &AdviceContext) -> Result<String, AdviceError> {
        (**self).generate(model, context)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn series_with_forms(forms: &[f64]) -> Vec<DailyLoadRecord> {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        forms
            .iter()
            .enumerate()
            .map(|(i, &form)| DailyLoadRecord {
                date: start + chrono::Duration::days(i as i64),
                stress: 60.0,
                fitness: 40.0,
                fatigue: 40.0 - form,
                form,
                acr: Some(1.0),
            })
            .collect()
    }

    #[test]
    fn test_context_takes_trailing_week() {
        let forms: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let context = AdviceContext::from_series(&series_with_forms(&forms), None, None).unwrap();

        assert_eq!(context.recent_forms, vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(context.snapshot.record.form, 9.0);
    }

    #[test]
    fn test_empty_series_has_no_context() {
        assert!(AdviceContext::from_series(&[], None, None).is_none());
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let context =
            AdviceContext::from_series(&series_with_forms(&[1.0]), Some("  ".into()), Some("".into()))
                .unwrap();
        assert_eq!(context.goals, None);
        assert!(context.prompt().contains("ATHLETE NOTES: None"));
    }

    #[test]
    fn test_prompt_mentions_status() {
        let context = AdviceContext::from_series(
            &series_with_forms(&[-12.0]),
            Some("Sub-3 marathon".into()),
            Some("Slept badly".into()),
        )
        .unwrap();
        let prompt = context.prompt();

        assert!(prompt.contains("Sub-3 marathon"));
        assert!(prompt.contains("Slept badly"));
        assert!(prompt.contains("form -12.0"));
        assert!(prompt.contains("Optimal"));
    }

    #[test]
    fn test_fingerprint_ignores_sub_rounding_noise() {
        let a = AdviceContext::from_series(&series_with_forms(&[1.0, 2.0]), None, None).unwrap();
        let b = AdviceContext::from_series(&series_with_forms(&[1.0, 2.0001]), None, None).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_inputs() {
        let base = AdviceContext::from_series(&series_with_forms(&[1.0, 2.0]), None, None).unwrap();
        let moved = AdviceContext::from_series(&series_with_forms(&[1.0, 2.5]), None, None).unwrap();
        let noted =
            AdviceContext::from_series(&series_with_forms(&[1.0, 2.0]), None, Some("sore".into()))
                .unwrap();

        assert_ne!(base.fingerprint(), moved.fingerprint());
        assert_ne!(base.fingerprint(), noted.fingerprint());
        assert_eq!(base.fingerprint().len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_goals() {
        let series = series_with_forms(&[1.0, 2.0]);
        let base = AdviceContext::from_series(&series, None, None).unwrap();
        let marathon =
            AdviceContext::from_series(&series, Some("Spring marathon".into()), None).unwrap();
        let ultra = AdviceContext::from_series(&series, Some("Autumn 50k".into()), None).unwrap();

        assert_ne!(base.fingerprint(), marathon.fingerprint());
        assert_ne!(marathon.fingerprint(), ultra.fingerprint());
    }

    #[test]
    fn test_goals_and_notes_hash_apart() {
        let series = series_with_forms(&[1.0]);
        let as_goal = AdviceContext::from_series(&series, Some("taper".into()), None).unwrap();
        let as_note = AdviceContext::from_series(&series, None, Some("taper".into())).unwrap();

        assert_ne!(as_goal.fingerprint(), as_note.fingerprint());
    }

    #[test]
    fn test_only_rate_limits_retry() {
        let limited = AdviceError::RateLimited {
            model: "m".into(),
            retry_after: Some(Duration::from_secs(30)),
        };
        assert!(limited.is_retryable());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(30)));
        assert!(!AdviceError::NotConfigured.is_retryable());
    }
}
