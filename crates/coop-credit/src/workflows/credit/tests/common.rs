use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::workflows::credit::domain::{
    AffiliateId, AffiliateProfile, ApplicationId, Caller, CreditApplication, LendingPolicy, Role,
};
use crate::workflows::credit::evaluation::{
    EvaluationConfig, FixedScoring, RiskEvaluator, ScoringPolicy,
};
use crate::workflows::credit::repository::{
    AffiliateDirectory, ApplicationRecord, ApplicationRepository, DecisionNotice, DirectoryError,
    NotificationError, NotificationPublisher, RepositoryError,
};
use crate::workflows::credit::service::{CreditApplicationService, SubmitRequest};

pub(super) fn afiliado() -> Caller {
    Caller {
        user_id: "u-maria".to_string(),
        username: "maria.torres".to_string(),
        role: Role::Afiliado,
    }
}

pub(super) fn other_afiliado() -> Caller {
    Caller {
        user_id: "u-julio".to_string(),
        username: "julio.rojas".to_string(),
        role: Role::Afiliado,
    }
}

pub(super) fn analista() -> Caller {
    Caller {
        user_id: "u-elena".to_string(),
        username: "elena.prado".to_string(),
        role: Role::Analista,
    }
}

pub(super) fn admin() -> Caller {
    Caller {
        user_id: "u-root".to_string(),
        username: "admin".to_string(),
        role: Role::Admin,
    }
}

pub(super) fn submit_request() -> SubmitRequest {
    SubmitRequest {
        requested_amount: dec!(5000000),
        term_months: 24,
        purpose: Some("home improvements".to_string()),
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<ApplicationId, ApplicationRecord>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, application: CreditApplication) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        let record = ApplicationRecord {
            application,
            version: 1,
        };
        guard.insert(record.application.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn compare_and_update(
        &self,
        record: ApplicationRecord,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard
            .get_mut(&record.application.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != record.version {
            return Err(RepositoryError::StaleWrite);
        }
        let updated = ApplicationRecord {
            application: record.application,
            version: record.version + 1,
        };
        *stored = updated.clone();
        Ok(updated)
    }

    fn list_by_affiliate(
        &self,
        affiliate_id: &AffiliateId,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.application.affiliate_id == affiliate_id)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<DecisionNotice>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<DecisionNotice> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifier {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct StaticDirectory {
    profiles: Vec<(String, AffiliateProfile)>,
}

impl StaticDirectory {
    pub(super) fn seeded() -> Self {
        Self {
            profiles: vec![
                (
                    "u-maria".to_string(),
                    AffiliateProfile {
                        id: AffiliateId("af-001".to_string()),
                        display_name: "Maria Torres".to_string(),
                        document_number: "CC-1001".to_string(),
                        monthly_income: Some(dec!(1500000)),
                    },
                ),
                (
                    "u-julio".to_string(),
                    AffiliateProfile {
                        id: AffiliateId("af-002".to_string()),
                        display_name: "Julio Rojas".to_string(),
                        document_number: "CC-1002".to_string(),
                        monthly_income: None,
                    },
                ),
            ],
        }
    }
}

impl AffiliateDirectory for StaticDirectory {
    fn affiliate_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<AffiliateProfile>, DirectoryError> {
        Ok(self
            .profiles
            .iter()
            .find(|(user, _)| user == user_id)
            .map(|(_, profile)| profile.clone()))
    }

    fn affiliate(&self, id: &AffiliateId) -> Result<Option<AffiliateProfile>, DirectoryError> {
        Ok(self
            .profiles
            .iter()
            .find(|(_, profile)| &profile.id == id)
            .map(|(_, profile)| profile.clone()))
    }
}

pub(super) type TestService = CreditApplicationService<MemoryRepository, StaticDirectory, MemoryNotifier>;

pub(super) struct TestHarness {
    pub(super) service: Arc<TestService>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) notifier: Arc<MemoryNotifier>,
}

pub(super) fn harness_with_scoring(scoring: Arc<dyn ScoringPolicy>) -> TestHarness {
    harness_with(scoring, EvaluationConfig::default())
}

pub(super) fn harness_with(
    scoring: Arc<dyn ScoringPolicy>,
    config: EvaluationConfig,
) -> TestHarness {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let directory = Arc::new(StaticDirectory::seeded());
    let evaluator = Arc::new(RiskEvaluator::new(config, scoring));
    let service = Arc::new(CreditApplicationService::new(
        repository.clone(),
        directory,
        notifier.clone(),
        evaluator,
        LendingPolicy::default(),
    ));
    TestHarness {
        service,
        repository,
        notifier,
    }
}

/// Harness pinning the evaluator score so auto-decision paths are easy to
/// steer from tests.
pub(super) fn harness(score: u32) -> TestHarness {
    harness_with_scoring(Arc::new(FixedScoring(score)))
}

pub(super) fn pending_application(harness: &TestHarness) -> ApplicationId {
    let record = harness
        .service
        .submit(&afiliado(), submit_request())
        .expect("submission accepted");
    record.application.id
}

pub(super) fn amount(value: i64) -> Decimal {
    Decimal::from(value)
}
