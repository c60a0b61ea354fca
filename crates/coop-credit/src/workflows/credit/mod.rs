//! Credit application lifecycle and risk-gated approval workflow.
//!
//! Submission freezes principal, term, and the policy interest rate, and
//! caches the amortized monthly payment. From PENDING an application moves
//! to exactly one of APPROVED, REJECTED, or CANCELLED, either by an
//! analyst decision or by the configured auto-decision policy attached to
//! the risk evaluation. Terminal states admit no further transitions.

pub mod amortization;
pub mod authorization;
pub mod domain;
pub mod evaluation;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use authorization::{authorize, AccessDecision};
pub use domain::{
    AffiliateId, AffiliateProfile, ApplicationId, Caller, CreditAction, CreditApplication,
    CreditStatus, Disposition, InvalidTransition, LendingPolicy, RiskEvaluation, RiskLevel, Role,
    ALLOWED_TERM_MONTHS,
};
pub use evaluation::{
    AffordabilityScoring, AutoAction, AutoDecisionPolicy, EvaluationConfig, FixedScoring,
    RiskEvaluator, ScoreBreakdown, ScoreComponent, ScoringPolicy,
};
pub use repository::{
    AffiliateDirectory, ApplicationRecord, ApplicationRepository, ApplicationView, DecisionNotice,
    DirectoryError, NotificationError, NotificationPublisher, RepositoryError,
};
pub use router::credit_router;
pub use service::{CreditApplicationService, ServiceError, SubmitRequest};
