use serde::{Deserialize, Serialize};

use super::super::domain::RiskLevel;

/// What the workflow does on its own once a risk level is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoAction {
    /// Transition straight to APPROVED.
    Approve,
    /// Leave the application PENDING for a human decision.
    Hold,
    /// Transition straight to REJECTED.
    Reject,
}

/// Named auto-decision policy, one action per risk level. The default is
/// `{LOW: approve, MEDIUM: hold, HIGH: reject}`; deployments can override
/// any leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDecisionPolicy {
    pub low: AutoAction,
    pub medium: AutoAction,
    pub high: AutoAction,
}

impl Default for AutoDecisionPolicy {
    fn default() -> Self {
        Self {
            low: AutoAction::Approve,
            medium: AutoAction::Hold,
            high: AutoAction::Reject,
        }
    }
}

impl AutoDecisionPolicy {
    pub const fn action_for(&self, level: RiskLevel) -> AutoAction {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }
}

/// Evaluator configuration: score-to-level floors plus the auto-decision
/// policy. Floors are non-overlapping by construction (`low_score_floor`
/// must sit above `medium_score_floor`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Scores at or above this floor rate LOW risk.
    pub low_score_floor: u32,
    /// Scores at or above this floor (and below the low floor) rate MEDIUM.
    pub medium_score_floor: u32,
    pub auto_decision: AutoDecisionPolicy,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            low_score_floor: 700,
            medium_score_floor: 400,
            auto_decision: AutoDecisionPolicy::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn risk_level_for(&self, score: u32) -> RiskLevel {
        if score >= self.low_score_floor {
            RiskLevel::Low
        } else if score >= self.medium_score_floor {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_the_documented_one() {
        let policy = AutoDecisionPolicy::default();
        assert_eq!(policy.action_for(RiskLevel::Low), AutoAction::Approve);
        assert_eq!(policy.action_for(RiskLevel::Medium), AutoAction::Hold);
        assert_eq!(policy.action_for(RiskLevel::High), AutoAction::Reject);
    }

    #[test]
    fn floors_partition_the_score_range() {
        let config = EvaluationConfig::default();
        assert_eq!(config.risk_level_for(1000), RiskLevel::Low);
        assert_eq!(config.risk_level_for(700), RiskLevel::Low);
        assert_eq!(config.risk_level_for(699), RiskLevel::Medium);
        assert_eq!(config.risk_level_for(400), RiskLevel::Medium);
        assert_eq!(config.risk_level_for(399), RiskLevel::High);
        assert_eq!(config.risk_level_for(0), RiskLevel::High);
    }
}
