use super::cache::{AdviceCache, CachedAdvice};
use super::{AdviceContext, AdviceError, AdviceProvider};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Advice front end: cache first, then each model in order
pub struct AdviceCoach<P> {
    provider: P,
    models: Vec<String>,
    cache: AdviceCache,
}

impl<P: AdviceProvider> AdviceCoach<P> {
    pub fn new(provider: P, models: Vec<String>) -> Self {
        Self::with_cache(provider, models, AdviceCache::new())
    }

    pub fn with_cache(provider: P, models: Vec<String>, cache: AdviceCache) -> Self {
        Self {
            provider,
            models,
            cache,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn cache(&self) -> &AdviceCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut AdviceCache {
        &mut self.cache
    }

    pub fn into_cache(self) -> AdviceCache {
        self.cache
    }

    /// Get advice for the context, reusing cached advice while it is fresh
    pub fn ask(&mut self, context: &AdviceContext) -> Result<CachedAdvice, AdviceError> {
        self.ask_at(context, Utc::now())
    }

    pub fn ask_at(
        &mut self,
        context: &AdviceContext,
        now: DateTime<Utc>,
    ) -> Result<CachedAdvice, AdviceError> {
        let fingerprint = context.fingerprint();
        if let Some(cached) = self.cache.get_at(&fingerprint, now) {
            return Ok(cached);
        }

        if self.models.is_empty() {
            return Err(AdviceError::NotConfigured);
        }

        let mut rate_limit = None;
        for model in &self.models {
            match self.provider.generate(model, context) {
                Ok(advice) => {
                    info!(model = %model, "Generated advice");
                    return Ok(self.cache.insert_at(&fingerprint, model, &advice, now));
                }
                Err(err @ AdviceError::RateLimited { .. }) => {
                    warn!(model = %model, "Advice model rate limited");
                    rate_limit.get_or_insert(err);
                }
                Err(err) => {
                    debug!(model = %model, error = %err, "Advice model failed");
                }
            }
        }

        match rate_limit {
            Some(err) => Err(err),
            None => Err(AdviceError::AllModelsFailed {
                attempted: self.models.clone(),
            }),
        }
    }

    /// Discard any cached advice for the context and ask again
    pub fn refresh(&mut self, context: &AdviceContext) -> Result<CachedAdvice, AdviceError> {
        self.refresh_at(context, Utc::now())
    }

    pub fn refresh_at(
        &mut self,
        context: &AdviceContext,
        now: DateTime<Utc>,
    ) -> Result<CachedAdvice, AdviceError> {
        self.cache.invalidate(&context.fingerprint());
        self.ask_at(context, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::tests::series_with_forms;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted provider: each model returns a fixed outcome
    #[derive(Default)]
    struct ScriptedProvider {
        outcomes: HashMap<&'static str, Outcome>,
        calls: RefCell<Vec<String>>,
    }

    #[derive(Clone, Copy)]
    enum Outcome {
        Advice(&'static str),
        RateLimited,
        Broken,
    }

    impl ScriptedProvider {
        fn with(mut self, model: &'static str, outcome: Outcome) -> Self {
            self.outcomes.insert(model, outcome);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl AdviceProvider for ScriptedProvider {
        fn generate(&self, model: &str, _context: &AdviceContext) -> Result<String, AdviceError> {
            self.calls.borrow_mut().push(model.to_string());
            match self.outcomes.get(model).copied().unwrap_or(Outcome::Broken) {
                Outcome::Advice(text) => Ok(text.to_string()),
                Outcome::RateLimited => Err(AdviceError::RateLimited {
                    model: model.to_string(),
                    retry_after: None,
                }),
                Outcome::Broken => Err(AdviceError::Provider {
                    model: model.to_string(),
                    message: "500".to_string(),
                }),
            }
        }
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn context(forms: &[f64]) -> AdviceContext {
        AdviceContext::from_series(&series_with_forms(forms), None, None).unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_falls_back_to_next_model() {
        let provider = ScriptedProvider::default()
            .with("fast", Outcome::Broken)
            .with("steady", Outcome::Advice("Recover today."));
        let mut coach = AdviceCoach::new(&provider, models(&["fast", "steady"]));

        let advice = coach.ask_at(&context(&[-20.0]), noon()).unwrap();
        assert_eq!(advice.advice, "Recover today.");
        assert_eq!(advice.model, "steady");
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_cached_until_expiry() {
        let provider = ScriptedProvider::default().with("fast", Outcome::Advice("Go long."));
        let mut coach = AdviceCoach::new(&provider, models(&["fast"]));
        let ctx = context(&[10.0]);

        coach.ask_at(&ctx, noon()).unwrap();
        coach.ask_at(&ctx, noon() + Duration::hours(5)).unwrap();
        assert_eq!(provider.call_count(), 1);

        coach.ask_at(&ctx, noon() + Duration::hours(7)).unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_changed_context_misses_cache() {
        let provider = ScriptedProvider::default().with("fast", Outcome::Advice("Go long."));
        let mut coach = AdviceCoach::new(&provider, models(&["fast"]));

        coach.ask_at(&context(&[10.0]), noon()).unwrap();
        coach.ask_at(&context(&[-10.0]), noon()).unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_rate_limit_reported_when_all_fail() {
        let provider = ScriptedProvider::default()
            .with("fast", Outcome::RateLimited)
            .with("steady", Outcome::Broken);
        let mut coach = AdviceCoach::new(&provider, models(&["fast", "steady"]));

        let err = coach.ask_at(&context(&[0.0]), noon()).unwrap_err();
        assert!(matches!(err, AdviceError::RateLimited { .. }));
        assert!(err.is_retryable());
        assert!(coach.cache().is_empty());
    }

    #[test]
    fn test_all_models_failed() {
        let provider = ScriptedProvider::default();
        let mut coach = AdviceCoach::new(&provider, models(&["fast", "steady"]));

        match coach.ask_at(&context(&[0.0]), noon()) {
            Err(AdviceError::AllModelsFailed { attempted }) => {
                assert_eq!(attempted, models(&["fast", "steady"]))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_no_models_configured() {
        let provider = ScriptedProvider::default();
        let mut coach = AdviceCoach::new(&provider, Vec::new());
        assert!(matches!(
            coach.ask_at(&context(&[0.0]), noon()),
            Err(AdviceError::NotConfigured)
        ));
    }

    #[test]
    fn test_refresh_bypasses_cache() {
        let provider = ScriptedProvider::default().with("fast", Outcome::Advice("Tempo run."));
        let mut coach = AdviceCoach::new(&provider, models(&["fast"]));
        let ctx = context(&[3.0]);

        coach.ask_at(&ctx, noon()).unwrap();
        coach.refresh_at(&ctx, noon() + Duration::minutes(1)).unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(coach.cache().len(), 1);
    }
}
