use rust_decimal_macros::dec;

use super::common::*;
use crate::workflows::credit::domain::{ApplicationId, Caller, CreditStatus, Role};
use crate::workflows::credit::repository::ApplicationRepository;
use crate::workflows::credit::service::{ServiceError, SubmitRequest};

#[test]
fn submit_computes_and_freezes_the_payment() {
    let harness = harness(750);
    let record = harness
        .service
        .submit(&afiliado(), submit_request())
        .expect("submission accepted");

    let application = &record.application;
    assert_eq!(application.status(), CreditStatus::Pending);
    assert_eq!(application.interest_rate, dec!(12.5));
    assert_eq!(application.monthly_payment, dec!(236536.54));
    assert_eq!(application.affiliate_name, "Maria Torres");
    assert!(application.risk_evaluation.is_none());
}

#[test]
fn submit_rejects_out_of_bounds_amounts() {
    let harness = harness(750);

    for bad_amount in [dec!(99999), dec!(50000001), dec!(0)] {
        let err = harness
            .service
            .submit(
                &afiliado(),
                SubmitRequest {
                    requested_amount: bad_amount,
                    term_months: 24,
                    purpose: None,
                },
            )
            .expect_err("amount outside bounds");
        assert!(matches!(err, ServiceError::Validation(_)), "{bad_amount}");
    }
}

#[test]
fn submit_rejects_terms_outside_the_offered_set() {
    let harness = harness(750);

    for bad_term in [0u32, 7, 13, 61, 120] {
        let err = harness
            .service
            .submit(
                &afiliado(),
                SubmitRequest {
                    requested_amount: dec!(5000000),
                    term_months: bad_term,
                    purpose: None,
                },
            )
            .expect_err("term outside offered set");
        assert!(matches!(err, ServiceError::Validation(_)), "{bad_term}");
    }
}

#[test]
fn submit_requires_an_affiliate_profile() {
    let harness = harness(750);
    let stranger = Caller {
        user_id: "u-ghost".to_string(),
        username: "ghost".to_string(),
        role: Role::Afiliado,
    };

    let err = harness
        .service
        .submit(&stranger, submit_request())
        .expect_err("no affiliate profile");
    match err {
        ServiceError::Validation(message) => assert!(message.contains("affiliate profile")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn evaluate_auto_approves_low_risk() {
    let harness = harness(750);
    let id = pending_application(&harness);

    let record = harness
        .service
        .evaluate(&analista(), &id)
        .expect("evaluation runs");

    assert_eq!(record.application.status(), CreditStatus::Approved);
    let evaluation = record.application.risk_evaluation.as_ref().expect("evaluation recorded");
    assert_eq!(evaluation.score, 750);
    assert_eq!(record.application.evaluated_by(), Some("elena.prado"));

    let events = harness.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "credit_approved");
    assert_eq!(events[0].application_id, id);
}

#[test]
fn evaluate_auto_rejects_high_risk_with_score_in_reason() {
    let harness = harness(210);
    let id = pending_application(&harness);

    let record = harness
        .service
        .evaluate(&analista(), &id)
        .expect("evaluation runs");

    assert_eq!(record.application.status(), CreditStatus::Rejected);
    let reason = record
        .application
        .rejection_reason()
        .expect("reason recorded");
    assert!(reason.contains("210"));
    assert!(harness.notifier.events().is_empty());
}

#[test]
fn evaluate_holds_medium_risk_for_a_human() {
    let harness = harness(550);
    let id = pending_application(&harness);

    let record = harness
        .service
        .evaluate(&analista(), &id)
        .expect("evaluation runs");

    assert_eq!(record.application.status(), CreditStatus::Pending);
    assert!(record.application.risk_evaluation.is_some());

    // The held application can then be decided manually.
    let record = harness
        .service
        .approve(&analista(), &id)
        .expect("manual approval after hold");
    assert_eq!(record.application.status(), CreditStatus::Approved);
}

#[test]
fn reject_requires_a_reason() {
    let harness = harness(550);
    let id = pending_application(&harness);

    for empty in ["", "   "] {
        let err = harness
            .service
            .reject(&analista(), &id, empty)
            .expect_err("reason required");
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    let record = harness
        .service
        .reject(&analista(), &id, "insufficient collateral")
        .expect("rejection with reason");
    assert_eq!(
        record.application.rejection_reason(),
        Some("insufficient collateral")
    );
}

#[test]
fn affiliates_may_not_decide_applications() {
    let harness = harness(750);
    let id = pending_application(&harness);

    for result in [
        harness.service.evaluate(&afiliado(), &id),
        harness.service.approve(&afiliado(), &id),
        harness.service.reject(&afiliado(), &id, "because"),
    ] {
        match result {
            Err(ServiceError::Forbidden(_)) => {}
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
}

#[test]
fn analysts_may_not_cancel_for_an_affiliate() {
    let harness = harness(750);
    let id = pending_application(&harness);

    for caller in [analista(), admin()] {
        match harness.service.cancel(&caller, &id) {
            Err(ServiceError::Forbidden(_)) => {}
            other => panic!("expected forbidden for {caller:?}, got {other:?}"),
        }
    }
}

#[test]
fn cancel_is_owner_only() {
    let harness = harness(750);
    let id = pending_application(&harness);

    match harness.service.cancel(&other_afiliado(), &id) {
        Err(ServiceError::Forbidden(message)) => {
            assert!(message.contains("requesting affiliate"))
        }
        other => panic!("expected forbidden, got {other:?}"),
    }

    let record = harness
        .service
        .cancel(&afiliado(), &id)
        .expect("owner cancels");
    assert_eq!(record.application.status(), CreditStatus::Cancelled);
}

#[test]
fn terminal_applications_admit_no_further_transitions() {
    let harness = harness(750);
    let id = pending_application(&harness);
    harness
        .service
        .reject(&analista(), &id, "document mismatch")
        .expect("rejection");

    for result in [
        harness.service.evaluate(&analista(), &id),
        harness.service.approve(&analista(), &id),
        harness.service.reject(&analista(), &id, "again"),
        harness.service.cancel(&afiliado(), &id),
    ] {
        match result {
            Err(ServiceError::InvalidTransition(err)) => {
                assert_eq!(err.current, CreditStatus::Rejected)
            }
            other => panic!("expected invalid transition, got {other:?}"),
        }
    }

    // Exactly one write happened after submission.
    let stored = harness
        .repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.version, 2);
}

#[test]
fn get_scopes_affiliates_to_their_own_applications() {
    let harness = harness(750);
    let id = pending_application(&harness);

    assert!(harness.service.get(&afiliado(), &id).is_ok());
    assert!(harness.service.get(&analista(), &id).is_ok());

    match harness.service.get(&other_afiliado(), &id) {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn unknown_application_is_not_found() {
    let harness = harness(750);
    let missing = ApplicationId("app-999999".to_string());

    match harness.service.get(&analista(), &missing) {
        Err(ServiceError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn list_mine_and_list_all_are_role_scoped() {
    let harness = harness(750);
    let id = pending_application(&harness);

    let mine = harness
        .service
        .list_mine(&afiliado())
        .expect("owner lists their applications");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].application.id, id);

    let theirs = harness
        .service
        .list_mine(&other_afiliado())
        .expect("other affiliate lists");
    assert!(theirs.is_empty());

    let all = harness.service.list_all(&analista()).expect("analyst lists all");
    assert_eq!(all.len(), 1);

    match harness.service.list_all(&afiliado()) {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
    match harness.service.list_mine(&analista()) {
        Err(ServiceError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn manual_approval_notifies_the_member() {
    let harness = harness(550);
    let id = pending_application(&harness);
    harness.service.evaluate(&analista(), &id).expect("held");

    harness
        .service
        .approve(&admin(), &id)
        .expect("admin approves");

    let events = harness.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].details.get("evaluated_by").map(String::as_str),
        Some("admin")
    );
}
