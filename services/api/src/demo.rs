use std::sync::Arc;

use clap::Args;
use rust_decimal::Decimal;

use crate::infra::{
    default_evaluation_config, InMemoryApplicationRepository, InMemoryNotificationPublisher,
    StaticAffiliateDirectory,
};
use coop_credit::error::AppError;
use coop_credit::workflows::credit::{
    Caller, CreditApplicationService, LendingPolicy, RiskEvaluator, Role, SubmitRequest,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Requested principal (defaults to 5,000,000)
    #[arg(long)]
    pub(crate) amount: Option<Decimal>,
    /// Repayment term in months (defaults to 24)
    #[arg(long)]
    pub(crate) term_months: Option<u32>,
    /// Free-text purpose attached to the application
    #[arg(long)]
    pub(crate) purpose: Option<String>,
}

/// Drives the full workflow against the in-memory stack: an affiliate
/// submits, an analyst evaluates, and the auto-decision outcome plus any
/// notifications are printed as the API would serialize them.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        amount,
        term_months,
        purpose,
    } = args;

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let directory = Arc::new(StaticAffiliateDirectory::seeded());
    let notifier = Arc::new(InMemoryNotificationPublisher::default());
    let evaluator = Arc::new(RiskEvaluator::with_default_scoring(
        default_evaluation_config(),
    ));
    let service = CreditApplicationService::new(
        repository,
        directory,
        notifier.clone(),
        evaluator,
        LendingPolicy::default(),
    );

    let affiliate = Caller {
        user_id: "u-1001".to_string(),
        username: "ana.beltran".to_string(),
        role: Role::Afiliado,
    };
    let analyst = Caller {
        user_id: "u-an-01".to_string(),
        username: "demo.analyst".to_string(),
        role: Role::Analista,
    };

    let request = SubmitRequest {
        requested_amount: amount.unwrap_or_else(|| Decimal::from(5_000_000u32)),
        term_months: term_months.unwrap_or(24),
        purpose: purpose.or_else(|| Some("home improvements".to_string())),
    };

    let submitted = service.submit(&affiliate, request)?;
    println!("submitted application:");
    println!("{}", serde_json::to_string_pretty(&submitted.view())?);

    let decided = service.evaluate(&analyst, &submitted.application.id)?;
    println!("\nafter risk evaluation:");
    println!("{}", serde_json::to_string_pretty(&decided.view())?);

    let notices = notifier.events();
    if notices.is_empty() {
        println!("\nno decision notifications were sent");
    } else {
        println!("\ndecision notifications:");
        for notice in notices {
            println!("{}", serde_json::to_string_pretty(&notice)?);
        }
    }

    Ok(())
}
