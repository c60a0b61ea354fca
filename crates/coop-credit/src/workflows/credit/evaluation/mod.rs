mod config;
mod scoring;

pub use config::{AutoAction, AutoDecisionPolicy, EvaluationConfig};
pub use scoring::{
    AffordabilityScoring, FixedScoring, RiskFactor, ScoreBreakdown, ScoreComponent, ScoringPolicy,
    MAX_SCORE,
};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{AffiliateProfile, CreditApplication, RiskEvaluation, RiskLevel};

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_id() -> String {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("risk-{id:06}")
}

/// Stateless evaluator combining a scoring policy with the configured
/// level floors. Never mutates the application; the state machine consumes
/// the returned value.
pub struct RiskEvaluator {
    config: EvaluationConfig,
    scoring: Arc<dyn ScoringPolicy>,
}

impl RiskEvaluator {
    pub fn new(config: EvaluationConfig, scoring: Arc<dyn ScoringPolicy>) -> Self {
        Self { config, scoring }
    }

    pub fn with_default_scoring(config: EvaluationConfig) -> Self {
        Self::new(config, Arc::new(AffordabilityScoring))
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Score a snapshot and derive level plus recommendation. Re-running on
    /// an unchanged snapshot reproduces the same score and level.
    pub fn evaluate(
        &self,
        application: &CreditApplication,
        affiliate: &AffiliateProfile,
        at: DateTime<Utc>,
    ) -> RiskEvaluation {
        let breakdown = self.scoring.score(application, affiliate);
        let risk_level = self.config.risk_level_for(breakdown.total);
        let recommendation = recommendation_for(risk_level, &breakdown);

        RiskEvaluation {
            id: next_evaluation_id(),
            score: breakdown.total,
            risk_level,
            recommendation,
            evaluated_at: at,
        }
    }

    pub fn auto_action(&self, level: RiskLevel) -> AutoAction {
        self.config.auto_decision.action_for(level)
    }
}

fn recommendation_for(level: RiskLevel, breakdown: &ScoreBreakdown) -> String {
    let trail = breakdown
        .components
        .iter()
        .map(|component| component.notes.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    match level {
        RiskLevel::Low => format!(
            "Excellent credit standing (score {}). Approval recommended. Factors: {trail}",
            breakdown.total
        ),
        RiskLevel::Medium => format!(
            "Acceptable credit standing (score {}). Review additional conditions. Factors: {trail}",
            breakdown.total
        ),
        RiskLevel::High => format!(
            "Deficient credit standing (score {}). Rejection or collateral recommended. Factors: {trail}",
            breakdown.total
        ),
    }
}
