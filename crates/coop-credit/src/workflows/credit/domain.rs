use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for credit applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for cooperative affiliates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AffiliateId(pub String);

impl fmt::Display for AffiliateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roles recognized by the authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Afiliado,
    Analista,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Afiliado => "AFILIADO",
            Role::Analista => "ANALISTA",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AFILIADO" => Ok(Role::Afiliado),
            "ANALISTA" => Ok(Role::Analista),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Resolved identity attached to every request by the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

/// Affiliate snapshot returned by the directory port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliateProfile {
    pub id: AffiliateId,
    pub display_name: String,
    pub document_number: String,
    pub monthly_income: Option<Decimal>,
}

/// Operations the workflow exposes; the unit the authorization matrix is
/// keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditAction {
    Submit,
    Evaluate,
    Approve,
    Reject,
    Cancel,
    View,
    ListOwn,
    ListAll,
}

impl CreditAction {
    pub const fn label(self) -> &'static str {
        match self {
            CreditAction::Submit => "submit",
            CreditAction::Evaluate => "evaluate",
            CreditAction::Approve => "approve",
            CreditAction::Reject => "reject",
            CreditAction::Cancel => "cancel",
            CreditAction::View => "view",
            CreditAction::ListOwn => "list own",
            CreditAction::ListAll => "list all",
        }
    }
}

impl fmt::Display for CreditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Externally visible status of an application. PENDING is the only
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl CreditStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CreditStatus::Pending => "PENDING",
            CreditStatus::Approved => "APPROVED",
            CreditStatus::Rejected => "REJECTED",
            CreditStatus::Cancelled => "CANCELLED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, CreditStatus::Pending)
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle variant carrying only the data valid in each state: a rejection
/// reason exists exactly when the application is rejected, and evaluator
/// attribution exists exactly when an analyst decision occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Pending,
    Approved {
        evaluated_at: DateTime<Utc>,
        evaluated_by: String,
    },
    Rejected {
        evaluated_at: DateTime<Utc>,
        evaluated_by: String,
        reason: String,
    },
    Cancelled {
        cancelled_at: DateTime<Utc>,
    },
}

impl Disposition {
    pub const fn status(&self) -> CreditStatus {
        match self {
            Disposition::Pending => CreditStatus::Pending,
            Disposition::Approved { .. } => CreditStatus::Approved,
            Disposition::Rejected { .. } => CreditStatus::Rejected,
            Disposition::Cancelled { .. } => CreditStatus::Cancelled,
        }
    }
}

/// Severity ladder assigned by the risk evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scored risk assessment owned exclusively by one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvaluation {
    pub id: String,
    pub score: u32,
    pub risk_level: RiskLevel,
    pub recommendation: String,
    pub evaluated_at: DateTime<Utc>,
}

/// Intake bounds and the policy rate frozen into each application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingPolicy {
    pub annual_interest_rate: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub allowed_terms: Vec<u32>,
}

/// Repayment terms offered by the cooperative, in months.
pub const ALLOWED_TERM_MONTHS: [u32; 7] = [6, 12, 18, 24, 36, 48, 60];

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            annual_interest_rate: Decimal::from_parts(125, 0, 0, false, 1),
            min_amount: Decimal::from(100_000u32),
            max_amount: Decimal::from(50_000_000u32),
            allowed_terms: ALLOWED_TERM_MONTHS.to_vec(),
        }
    }
}

impl LendingPolicy {
    pub fn with_rate(annual_interest_rate: Decimal) -> Self {
        Self {
            annual_interest_rate,
            ..Self::default()
        }
    }

    /// Check intake bounds for a new application.
    pub fn validate(&self, requested_amount: Decimal, term_months: u32) -> Result<(), String> {
        if requested_amount < self.min_amount || requested_amount > self.max_amount {
            return Err(format!(
                "requested amount must be between {} and {}",
                self.min_amount, self.max_amount
            ));
        }
        if !self.allowed_terms.contains(&term_months) {
            return Err(format!(
                "term must be one of {:?} months, got {term_months}",
                self.allowed_terms
            ));
        }
        Ok(())
    }
}

/// Attempted transition that is not legal from the application's current
/// status. No mutation occurs when this is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} an application in status {current}")]
pub struct InvalidTransition {
    pub current: CreditStatus,
    pub action: CreditAction,
}

/// Aggregate root for one loan-credit request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditApplication {
    pub id: ApplicationId,
    pub affiliate_id: AffiliateId,
    pub affiliate_name: String,
    pub requested_amount: Decimal,
    pub term_months: u32,
    pub interest_rate: Decimal,
    pub monthly_payment: Decimal,
    pub purpose: Option<String>,
    #[serde(flatten)]
    pub disposition: Disposition,
    pub created_at: DateTime<Utc>,
    pub risk_evaluation: Option<RiskEvaluation>,
}

impl CreditApplication {
    pub fn status(&self) -> CreditStatus {
        self.disposition.status()
    }

    fn gate(&self, action: CreditAction) -> Result<(), InvalidTransition> {
        let current = self.status();
        if current.is_terminal() {
            return Err(InvalidTransition { current, action });
        }
        Ok(())
    }

    /// Attach (or refresh, while still pending) the risk evaluation for this
    /// application. The evaluation is never cleared once set.
    pub fn record_evaluation(
        &mut self,
        evaluation: RiskEvaluation,
    ) -> Result<(), InvalidTransition> {
        self.gate(CreditAction::Evaluate)?;
        self.risk_evaluation = Some(evaluation);
        Ok(())
    }

    pub fn approve(
        &mut self,
        evaluator: &str,
        at: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        self.gate(CreditAction::Approve)?;
        self.disposition = Disposition::Approved {
            evaluated_at: at,
            evaluated_by: evaluator.to_string(),
        };
        Ok(())
    }

    pub fn reject(
        &mut self,
        evaluator: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        self.gate(CreditAction::Reject)?;
        self.disposition = Disposition::Rejected {
            evaluated_at: at,
            evaluated_by: evaluator.to_string(),
            reason: reason.to_string(),
        };
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), InvalidTransition> {
        self.gate(CreditAction::Cancel)?;
        self.disposition = Disposition::Cancelled { cancelled_at: at };
        Ok(())
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.disposition {
            Disposition::Rejected { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn evaluated_by(&self) -> Option<&str> {
        match &self.disposition {
            Disposition::Approved { evaluated_by, .. }
            | Disposition::Rejected { evaluated_by, .. } => Some(evaluated_by.as_str()),
            _ => None,
        }
    }

    pub fn evaluated_at(&self) -> Option<DateTime<Utc>> {
        match &self.disposition {
            Disposition::Approved { evaluated_at, .. }
            | Disposition::Rejected { evaluated_at, .. } => Some(*evaluated_at),
            _ => None,
        }
    }
}
