use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::amortization;
use super::authorization::{authorize, AccessDecision};
use super::domain::{
    ApplicationId, Caller, CreditAction, CreditApplication, CreditStatus, Disposition,
    InvalidTransition, LendingPolicy, Role,
};
use super::evaluation::{AutoAction, RiskEvaluator};
use super::repository::{
    AffiliateDirectory, ApplicationRecord, ApplicationRepository, DecisionNotice, DirectoryError,
    NotificationError, NotificationPublisher, RepositoryError,
};

/// Inbound shape for a new application; the affiliate identity comes from
/// the caller, never from the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub requested_amount: Decimal,
    pub term_months: u32,
    #[serde(default)]
    pub purpose: Option<String>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Orchestrates load, authorization, state transition, and optimistic
/// persist for every credit application operation.
pub struct CreditApplicationService<R, D, N> {
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    evaluator: Arc<RiskEvaluator>,
    lending: LendingPolicy,
}

/// Error raised by the application service, one variant per boundary error
/// kind so the router can map them to stable response shapes.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("credit application {0} not found")]
    NotFound(ApplicationId),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("credit application {0} was modified concurrently; reload before retrying")]
    ConcurrentModification(ApplicationId),
    #[error(transparent)]
    Repository(RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl<R, D, N> CreditApplicationService<R, D, N>
where
    R: ApplicationRepository + 'static,
    D: AffiliateDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifier: Arc<N>,
        evaluator: Arc<RiskEvaluator>,
        lending: LendingPolicy,
    ) -> Self {
        Self {
            repository,
            directory,
            notifier,
            evaluator,
            lending,
        }
    }

    /// Register a new application for the calling affiliate. The monthly
    /// payment is computed once here; principal, term, and rate are frozen
    /// for the lifetime of the application.
    pub fn submit(
        &self,
        caller: &Caller,
        request: SubmitRequest,
    ) -> Result<ApplicationRecord, ServiceError> {
        self.check(caller, CreditAction::Submit)?;

        let affiliate = self
            .directory
            .affiliate_for_user(&caller.user_id)?
            .ok_or_else(|| {
                ServiceError::Validation(
                    "complete your affiliate profile before requesting credit".to_string(),
                )
            })?;

        self.lending
            .validate(request.requested_amount, request.term_months)
            .map_err(ServiceError::Validation)?;

        let rate = self.lending.annual_interest_rate;
        let monthly_payment =
            amortization::monthly_payment(request.requested_amount, rate, request.term_months);

        let application = CreditApplication {
            id: next_application_id(),
            affiliate_id: affiliate.id.clone(),
            affiliate_name: affiliate.display_name.clone(),
            requested_amount: request.requested_amount,
            term_months: request.term_months,
            interest_rate: rate,
            monthly_payment,
            purpose: request.purpose,
            disposition: Disposition::Pending,
            created_at: Utc::now(),
            risk_evaluation: None,
        };

        let record = self
            .repository
            .insert(application)
            .map_err(ServiceError::Repository)?;

        info!(
            id = %record.application.id,
            affiliate = %affiliate.id,
            amount = %record.application.requested_amount,
            term = record.application.term_months,
            "credit application submitted"
        );

        Ok(record)
    }

    /// Run the risk evaluation and apply the configured auto-decision. The
    /// returned snapshot may already be APPROVED or REJECTED when the risk
    /// level crosses a policy threshold; MEDIUM holds stay PENDING for a
    /// human decision.
    pub fn evaluate(
        &self,
        caller: &Caller,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, ServiceError> {
        self.check(caller, CreditAction::Evaluate)?;

        let mut record = self.load(id)?;
        let affiliate = self
            .directory
            .affiliate(&record.application.affiliate_id)?
            .ok_or_else(|| {
                ServiceError::Validation(format!(
                    "affiliate {} for application {id} is no longer on file",
                    record.application.affiliate_id
                ))
            })?;

        let now = Utc::now();
        let evaluation = self.evaluator.evaluate(&record.application, &affiliate, now);
        let score = evaluation.score;
        let level = evaluation.risk_level;

        record.application.record_evaluation(evaluation)?;

        match self.evaluator.auto_action(level) {
            AutoAction::Approve => {
                record.application.approve(&caller.username, now)?;
                info!(%id, score, %level, "application auto-approved by risk policy");
            }
            AutoAction::Reject => {
                let reason = format!("insufficient risk score: {score} ({level} risk)");
                record.application.reject(&caller.username, &reason, now)?;
                info!(%id, score, %level, "application auto-rejected by risk policy");
            }
            AutoAction::Hold => {
                info!(%id, score, %level, "application held for manual decision");
            }
        }

        let record = self.persist(record)?;
        if record.application.status() == CreditStatus::Approved {
            self.notify_approval(&record, &caller.username)?;
        }
        Ok(record)
    }

    /// Manually approve a pending application.
    pub fn approve(
        &self,
        caller: &Caller,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, ServiceError> {
        self.check(caller, CreditAction::Approve)?;

        let mut record = self.load(id)?;
        record.application.approve(&caller.username, Utc::now())?;

        let record = self.persist(record)?;
        info!(%id, evaluator = %caller.username, "application approved manually");
        self.notify_approval(&record, &caller.username)?;
        Ok(record)
    }

    /// Manually reject a pending application; the reason is mandatory and
    /// becomes part of the terminal state.
    pub fn reject(
        &self,
        caller: &Caller,
        id: &ApplicationId,
        reason: &str,
    ) -> Result<ApplicationRecord, ServiceError> {
        self.check(caller, CreditAction::Reject)?;

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }

        let mut record = self.load(id)?;
        record.application.reject(&caller.username, reason, Utc::now())?;

        let record = self.persist(record)?;
        info!(%id, evaluator = %caller.username, reason, "application rejected manually");
        Ok(record)
    }

    /// Requester-initiated withdrawal of a pending application.
    pub fn cancel(
        &self,
        caller: &Caller,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, ServiceError> {
        self.check(caller, CreditAction::Cancel)?;

        let mut record = self.load(id)?;
        self.ensure_owner(caller, &record, "cancel")?;

        record.application.cancel(Utc::now())?;
        let record = self.persist(record)?;
        info!(%id, "application cancelled by requester");
        Ok(record)
    }

    /// Fetch one application; affiliates see only their own.
    pub fn get(
        &self,
        caller: &Caller,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, ServiceError> {
        self.check(caller, CreditAction::View)?;

        let record = self.load(id)?;
        if caller.role == Role::Afiliado {
            self.ensure_owner(caller, &record, "view")?;
        }
        Ok(record)
    }

    /// Applications owned by the calling affiliate; an empty list when no
    /// affiliate profile exists yet.
    pub fn list_mine(&self, caller: &Caller) -> Result<Vec<ApplicationRecord>, ServiceError> {
        self.check(caller, CreditAction::ListOwn)?;

        match self.directory.affiliate_for_user(&caller.user_id)? {
            Some(affiliate) => self
                .repository
                .list_by_affiliate(&affiliate.id)
                .map_err(ServiceError::Repository),
            None => Ok(Vec::new()),
        }
    }

    /// Every application in the book; analyst/admin only.
    pub fn list_all(&self, caller: &Caller) -> Result<Vec<ApplicationRecord>, ServiceError> {
        self.check(caller, CreditAction::ListAll)?;
        self.repository.list_all().map_err(ServiceError::Repository)
    }

    fn check(&self, caller: &Caller, action: CreditAction) -> Result<(), ServiceError> {
        match authorize(caller.role, action) {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied { reason } => Err(ServiceError::Forbidden(reason)),
        }
    }

    fn load(&self, id: &ApplicationId) -> Result<ApplicationRecord, ServiceError> {
        self.repository
            .fetch(id)
            .map_err(ServiceError::Repository)?
            .ok_or_else(|| ServiceError::NotFound(id.clone()))
    }

    fn persist(&self, record: ApplicationRecord) -> Result<ApplicationRecord, ServiceError> {
        let id = record.application.id.clone();
        self.repository
            .compare_and_update(record)
            .map_err(|err| match err {
                RepositoryError::StaleWrite => ServiceError::ConcurrentModification(id),
                RepositoryError::NotFound => ServiceError::NotFound(id),
                other => ServiceError::Repository(other),
            })
    }

    fn ensure_owner(
        &self,
        caller: &Caller,
        record: &ApplicationRecord,
        verb: &str,
    ) -> Result<(), ServiceError> {
        let owns = self
            .directory
            .affiliate_for_user(&caller.user_id)?
            .map(|affiliate| affiliate.id == record.application.affiliate_id)
            .unwrap_or(false);

        if owns {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "only the requesting affiliate may {verb} application {}",
                record.application.id
            )))
        }
    }

    fn notify_approval(
        &self,
        record: &ApplicationRecord,
        evaluator: &str,
    ) -> Result<(), ServiceError> {
        let mut details = BTreeMap::new();
        details.insert("decision".to_string(), "approved".to_string());
        details.insert("evaluated_by".to_string(), evaluator.to_string());
        self.notifier.publish(DecisionNotice {
            template: "credit_approved".to_string(),
            application_id: record.application.id.clone(),
            details,
        })?;
        Ok(())
    }
}
