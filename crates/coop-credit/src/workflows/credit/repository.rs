use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{
    AffiliateId, AffiliateProfile, ApplicationId, CreditApplication, RiskEvaluation,
};

/// Versioned record handed across the persistence boundary. The version is
/// the optimistic-concurrency token: a write succeeds only if the stored
/// version still matches the one that was read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application: CreditApplication,
    pub version: u64,
}

impl ApplicationRecord {
    /// Flattened, serialization-friendly shape for API responses.
    pub fn view(&self) -> ApplicationView {
        let application = &self.application;
        ApplicationView {
            id: application.id.clone(),
            affiliate_id: application.affiliate_id.clone(),
            affiliate_name: application.affiliate_name.clone(),
            requested_amount: application.requested_amount,
            term_months: application.term_months,
            interest_rate: application.interest_rate,
            monthly_payment: application.monthly_payment,
            purpose: application.purpose.clone(),
            status: application.status().label(),
            created_at: application.created_at,
            evaluated_at: application.evaluated_at(),
            evaluated_by: application.evaluated_by().map(str::to_string),
            rejection_reason: application.rejection_reason().map(str::to_string),
            risk_evaluation: application.risk_evaluation.clone(),
        }
    }
}

/// Sanitized representation of an application's exposed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub affiliate_id: AffiliateId,
    pub affiliate_name: String,
    pub requested_amount: Decimal,
    pub term_months: u32,
    pub interest_rate: Decimal,
    pub monthly_payment: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_evaluation: Option<RiskEvaluation>,
}

/// Storage abstraction for applications. `compare_and_update` is the only
/// mutating write after insert and must be atomic with respect to the
/// version check.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: CreditApplication) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// Persist a mutated record. Fails with [`RepositoryError::StaleWrite`]
    /// when the stored version no longer matches `record.version`; succeeds
    /// with the bumped record otherwise.
    fn compare_and_update(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn list_by_affiliate(
        &self,
        affiliate_id: &AffiliateId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn list_all(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record was modified since it was read")]
    StaleWrite,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Affiliate lookups the workflow needs from the membership system.
pub trait AffiliateDirectory: Send + Sync {
    /// Profile for the affiliate owned by a platform user, if any.
    fn affiliate_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<AffiliateProfile>, DirectoryError>;
    /// Profile by affiliate identifier.
    fn affiliate(&self, id: &AffiliateId) -> Result<Option<AffiliateProfile>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("affiliate directory unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook notifying members of terminal decisions.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError>;
}

/// Notification payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNotice {
    pub template: String,
    pub application_id: ApplicationId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
