use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{
    default_evaluation_config, AppState, InMemoryApplicationRepository,
    InMemoryNotificationPublisher, StaticAffiliateDirectory,
};
use crate::routes::with_credit_routes;
use coop_credit::config::AppConfig;
use coop_credit::error::AppError;
use coop_credit::telemetry;
use coop_credit::workflows::credit::{CreditApplicationService, LendingPolicy, RiskEvaluator};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let directory = Arc::new(StaticAffiliateDirectory::seeded());
    let notifier = Arc::new(InMemoryNotificationPublisher::default());
    let evaluator = Arc::new(RiskEvaluator::with_default_scoring(
        default_evaluation_config(),
    ));
    let lending = LendingPolicy::with_rate(config.lending.annual_interest_rate);
    let service = Arc::new(CreditApplicationService::new(
        repository, directory, notifier, evaluator, lending,
    ));

    let app = with_credit_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "cooperative credit service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
