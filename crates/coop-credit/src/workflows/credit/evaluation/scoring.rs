use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::super::domain::{AffiliateProfile, CreditApplication};

/// Ceiling of the score range; scores are clamped into `0..=MAX_SCORE`.
pub const MAX_SCORE: u32 = 1000;

/// Factors the default rubric weighs. Kept as an enum so audit output is
/// structured rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactor {
    Baseline,
    AmountToLimit,
    TermLength,
    PaymentBurden,
}

/// Discrete contribution to a score, kept for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: RiskFactor,
    pub points: i32,
    pub notes: String,
}

/// Composite score plus the trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub components: Vec<ScoreComponent>,
}

/// Pluggable scoring function. Implementations must be deterministic for a
/// given application snapshot and affiliate profile so that re-running an
/// evaluation reproduces the same score.
pub trait ScoringPolicy: Send + Sync {
    fn score(&self, application: &CreditApplication, affiliate: &AffiliateProfile)
        -> ScoreBreakdown;
}

/// Default rubric: a neutral baseline adjusted by how much of the lending
/// cap is requested, how long the loan runs, and how much of the member's
/// declared income the amortized payment consumes.
#[derive(Debug, Clone, Default)]
pub struct AffordabilityScoring;

const BASELINE: i32 = 500;

impl ScoringPolicy for AffordabilityScoring {
    fn score(
        &self,
        application: &CreditApplication,
        affiliate: &AffiliateProfile,
    ) -> ScoreBreakdown {
        let mut components = vec![ScoreComponent {
            factor: RiskFactor::Baseline,
            points: BASELINE,
            notes: "neutral starting point".to_string(),
        }];
        let mut total = BASELINE;

        let cap = Decimal::from(50_000_000u32);
        let ratio = application.requested_amount / cap;
        let (points, notes) = if ratio <= Decimal::from_parts(1, 0, 0, false, 1) {
            (150, format!("requested amount is {ratio:.2} of the lending cap"))
        } else if ratio <= Decimal::from_parts(4, 0, 0, false, 1) {
            (75, format!("moderate request at {ratio:.2} of the lending cap"))
        } else if ratio <= Decimal::from_parts(7, 0, 0, false, 1) {
            (0, format!("large request at {ratio:.2} of the lending cap"))
        } else {
            (-100, format!("request nears the lending cap ({ratio:.2})"))
        };
        components.push(ScoreComponent {
            factor: RiskFactor::AmountToLimit,
            points,
            notes,
        });
        total += points;

        let (points, notes) = match application.term_months {
            0..=12 => (100, "short repayment horizon".to_string()),
            13..=24 => (50, "medium repayment horizon".to_string()),
            25..=48 => (0, "long repayment horizon".to_string()),
            _ => (-50, "maximum repayment horizon".to_string()),
        };
        components.push(ScoreComponent {
            factor: RiskFactor::TermLength,
            points,
            notes,
        });
        total += points;

        let (points, notes) = match affiliate.monthly_income {
            Some(income) if income > Decimal::ZERO => {
                let burden = application.monthly_payment / income;
                if burden <= Decimal::from_parts(2, 0, 0, false, 1) {
                    (150, format!("payment consumes {burden:.2} of declared income"))
                } else if burden <= Decimal::from_parts(35, 0, 0, false, 2) {
                    (50, format!("payment consumes {burden:.2} of declared income"))
                } else if burden <= Decimal::from_parts(5, 0, 0, false, 1) {
                    (-50, format!("heavy payment burden at {burden:.2} of income"))
                } else {
                    (-150, format!("payment burden {burden:.2} exceeds half of income"))
                }
            }
            _ => (-25, "no declared income on file".to_string()),
        };
        components.push(ScoreComponent {
            factor: RiskFactor::PaymentBurden,
            points,
            notes,
        });
        total += points;

        ScoreBreakdown {
            total: total.clamp(0, MAX_SCORE as i32) as u32,
            components,
        }
    }
}

/// Test/ops helper that pins the score regardless of the snapshot, useful
/// when exercising the auto-decision policy in isolation.
#[derive(Debug, Clone, Copy)]
pub struct FixedScoring(pub u32);

impl ScoringPolicy for FixedScoring {
    fn score(&self, _: &CreditApplication, _: &AffiliateProfile) -> ScoreBreakdown {
        ScoreBreakdown {
            total: self.0.min(MAX_SCORE),
            components: vec![ScoreComponent {
                factor: RiskFactor::Baseline,
                points: self.0.min(MAX_SCORE) as i32,
                notes: "fixed score".to_string(),
            }],
        }
    }
}
