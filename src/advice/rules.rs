use super::{AdviceContext, AdviceError, AdviceProvider};
use crate::load_model::{FormInterpretation, RatioStatus};

/// Model name reported for offline advice
pub const RULE_BASED_MODEL: &str = "rule-based";

/// Offline provider that writes advice from the load status alone
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedProvider;

impl RuleBasedProvider {
    pub fn new() -> Self {
        RuleBasedProvider
    }

    fn short_term(context: &AdviceContext) -> String {
        let form = context.snapshot.record.form;
        let focus = match context.snapshot.form_interpretation {
            FormInterpretation::VeryFatigued => "Rest today and tomorrow; no hard sessions until form recovers",
            FormInterpretation::Fatigued => "Keep today easy and prioritise sleep before the next quality session",
            FormInterpretation::Neutral => "Train as planned; one quality session in the next two days is fine",
            FormInterpretation::Fresh => "You are fresh, so schedule a hard workout or race effort",
            FormInterpretation::VeryFresh => "You are very fresh, so push volume before fitness starts to slip",
        };
        format!("Short term (form {:.1}): {}.", form, focus)
    }

    fn long_term(context: &AdviceContext) -> String {
        let trend = match context.recent_forms.as_slice() {
            [first, .., last] if last - first > 5.0 => " Form is rising over the last week.",
            [first, .., last] if first - last > 5.0 => " Form is falling over the last week.",
            _ => "",
        };
        let plan = match context.snapshot.ratio_status {
            RatioStatus::HighRisk => "Load jumped far above what you are adapted to; cut back this week to stay injury-free",
            RatioStatus::Overreaching => "Load is building quickly; hold volume steady for a few days",
            RatioStatus::Optimal => "Load is in the productive range; keep progressing gradually",
            RatioStatus::Undertraining => "Load is below your base; add volume gradually to keep building",
        };
        match &context.goals {
            Some(goals) => format!("Long term: {} toward {}.{}", plan, goals, trend),
            None => format!("Long term: {}.{}", plan, trend),
        }
    }
}

impl AdviceProvider for RuleBasedProvider {
    fn generate(&self, _model: &str, context: &AdviceContext) -> Result<String, AdviceError> {
        Ok(format!("{}\n{}", Self::short_term(context), Self::long_term(context)))
    }
}
