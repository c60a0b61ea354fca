use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use coop_credit::workflows::credit::{
    AffiliateDirectory, AffiliateId, AffiliateProfile, ApplicationId, ApplicationRecord,
    ApplicationRepository, AutoDecisionPolicy, CreditApplication, DecisionNotice, DirectoryError,
    EvaluationConfig, NotificationError, NotificationPublisher, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Versioned in-memory store. A stand-in for the cooperative's database
/// that still honors the optimistic-concurrency contract.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<DecisionNotice>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError> {
        tracing::info!(
            template = %notice.template,
            application = %notice.application_id,
            "decision notification queued"
        );
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<DecisionNotice> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

/// Membership roster used until the directory service integration lands.
pub(crate) struct StaticAffiliateDirectory {
    profiles: Vec<(String, AffiliateProfile)>,
}

impl StaticAffiliateDirectory {
    pub(crate) fn seeded() -> Self {
        Self {
            profiles: vec![
                (
                    "u-1001".to_string(),
                    AffiliateProfile {
                        id: AffiliateId("af-1001".to_string()),
                        display_name: "Ana Beltran".to_string(),
                        document_number: "CC-52840193".to_string(),
                        monthly_income: Some(Decimal::from(3_200_000u32)),
                    },
                ),
                (
                    "u-1002".to_string(),
                    AffiliateProfile {
                        id: AffiliateId("af-1002".to_string()),
                        display_name: "Carlos Pena".to_string(),
                        document_number: "CC-79330516".to_string(),
                        monthly_income: Some(Decimal::from(1_800_000u32)),
                    },
                ),
                (
                    "u-1003".to_string(),
                    AffiliateProfile {
                        id: AffiliateId("af-1003".to_string()),
                        display_name: "Lucia Mendoza".to_string(),
                        document_number: "CC-41229874".to_string(),
                        monthly_income: None,
                    },
                ),
            ],
        }
    }
}

impl AffiliateDirectory for StaticAffiliateDirectory {
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

pub(crate) fn default_evaluation_config() -> EvaluationConfig {
    EvaluationConfig {
        low_score_floor: 700,
        medium_score_floor: 400,
        auto_decision: AutoDecisionPolicy::default(),
    }
}
