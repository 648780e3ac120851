mod common;

use std::sync::Arc;

use common::{in_hours, Harness};
use tokio_test::assert_ok;
use jobboard_backend::error::Error;
use jobboard_backend::models::application::{Actor, ApplicationStatus, LifecycleAction};
use uuid::Uuid;

#[tokio::test]
async fn happy_path_from_application_to_hire() {
    let h = Harness::new();

    let app = h.submit().await;
    assert_eq!(app.status, ApplicationStatus::Applied);
    assert_eq!(h.gateway.total(), 0, "no email on submission");

    let date = in_hours(72);
    let app = h
        .lifecycle
        .schedule_interview(h.company(), app.id, date)
        .await
        .expect("schedule");
    assert_eq!(app.status, ApplicationStatus::InterviewScheduled);
    assert_eq!(app.interview_date, Some(date));
    assert_eq!(h.gateway.count("interview_scheduled"), 1);
    let emails = h.gateway.sent();
    let scheduled = &emails[0];
    assert_eq!(scheduled.to, "alice@example.com");
    assert!(scheduled.data["accept_url"]
        .as_str()
        .unwrap()
        .contains("/accept"));
    assert!(scheduled.data["reschedule_url"]
        .as_str()
        .unwrap()
        .contains("/reschedule"));

    let app = assert_ok!(h.lifecycle.accept_interview(h.candidate(), app.id).await);
    assert_eq!(app.status, ApplicationStatus::InterviewConfirmed);
    let stored = h.store.get(app.id).unwrap();
    let credential = stored.access_credential.expect("credential generated");
    let confirmed = h.gateway.sent().into_iter().last().unwrap();
    assert_eq!(confirmed.template, "interview_confirmed");
    assert_eq!(confirmed.data["access_credential"].as_str(), Some(credential.as_str()));

    let app = h.lifecycle.hire(h.company(), app.id).await.expect("hire");
    assert_eq!(app.status, ApplicationStatus::Hired);
    assert_eq!(h.gateway.count("hired"), 1);
    assert_eq!(
        h.directory.position_label(h.candidate_id).as_deref(),
        Some("Backend Engineer at Acme Corp")
    );
}

#[tokio::test]
async fn reschedule_flow_updates_interview_date() {
    let h = Harness::new();
    let app = h.submit().await;

    let first = in_hours(48);
    h.lifecycle
        .schedule_interview(h.company(), app.id, first)
        .await
        .expect("first schedule");

    let app = h
        .lifecycle
        .request_reschedule(h.candidate(), app.id)
        .await
        .expect("request reschedule");
    assert_eq!(app.status, ApplicationStatus::RescheduleRequested);

    let second = in_hours(96);
    let app = h
        .lifecycle
        .schedule_interview(h.company(), app.id, second)
        .await
        .expect("second schedule");
    assert_eq!(app.status, ApplicationStatus::InterviewScheduled);
    assert_eq!(app.interview_date, Some(second));
}

#[tokio::test]
async fn duplicate_application_blocked_while_active() {
    let h = Harness::new();
    let app = h.submit().await;

    let err = h
        .lifecycle
        .submit_application(h.candidate(), h.new_application())
        .await
        .expect_err("second submission must fail");
    assert!(matches!(err, Error::DuplicateApplication));

    // A denial unblocks the pair; a fresh record is created.
    h.lifecycle.deny(h.company(), app.id).await.expect("deny");
    let reapplied = h
        .lifecycle
        .submit_application(h.candidate(), h.new_application())
        .await
        .expect("re-apply after denial");
    assert_ne!(reapplied.id, app.id);
    assert_eq!(reapplied.status, ApplicationStatus::Applied);
}

#[tokio::test]
async fn hired_application_blocks_reapplication() {
    let h = Harness::new();
    let app = h.submit().await;
    h.lifecycle.hire(h.company(), app.id).await.expect("hire");

    let err = h
        .lifecycle
        .submit_application(h.candidate(), h.new_application())
        .await
        .expect_err("hired still counts as active");
    assert!(matches!(err, Error::DuplicateApplication));
}

#[tokio::test]
async fn schedule_rejects_past_dates() {
    let h = Harness::new();
    let app = h.submit().await;
    let err = h
        .lifecycle
        .schedule_interview(h.company(), app.id, in_hours(-1))
        .await
        .expect_err("past date");
    assert!(matches!(err, Error::BadRequest(_)));
    assert_eq!(h.status_of(app.id), ApplicationStatus::Applied);
}

#[tokio::test]
async fn transition_matrix_is_enforced() {
    use ApplicationStatus::*;
    use LifecycleAction::*;

    let actions = [
        ScheduleInterview,
        AcceptInterview,
        RequestReschedule,
        RequestConfirmation,
        Hire,
        Deny,
    ];

    for from in ApplicationStatus::ALL {
        for action in actions {
            let h = Harness::new();
            let app = h.seed(from);
            let result = match action {
                ScheduleInterview => {
                    h.lifecycle
                        .schedule_interview(h.company(), app.id, in_hours(24))
                        .await
                }
                AcceptInterview => h.lifecycle.accept_interview(h.candidate(), app.id).await,
                RequestReschedule => h.lifecycle.request_reschedule(h.candidate(), app.id).await,
                RequestConfirmation => h.lifecycle.request_confirmation(h.company(), app.id).await,
                Hire => h.lifecycle.hire(h.company(), app.id).await,
                Deny => h.lifecycle.deny(h.company(), app.id).await,
                ConfirmViaToken => unreachable!(),
            };

            let expected = match action {
                ScheduleInterview if matches!(from, Applied | RescheduleRequested) => {
                    Some(InterviewScheduled)
                }
                AcceptInterview if from == InterviewScheduled => Some(InterviewConfirmed),
                RequestReschedule if from == InterviewScheduled => Some(RescheduleRequested),
                RequestConfirmation if !from.is_terminal() => Some(ConfirmationPending),
                // Repeating a terminal decision is an explicit no-op.
                Hire if from == Hired => Some(Hired),
                Deny if from == Denied => Some(Denied),
                Hire if !from.is_terminal() => Some(Hired),
                Deny if !from.is_terminal() => Some(Denied),
                _ => None,
            };

            match expected {
                Some(to) => {
                    let updated = result.unwrap_or_else(|e| {
                        panic!("{action:?} from {from} should succeed, got {e:?}")
                    });
                    assert_eq!(updated.status, to, "{action:?} from {from}");
                }
                None => {
                    let err = result.expect_err(&format!(
                        "{action:?} from {from} should be rejected"
                    ));
                    assert!(
                        matches!(err, Error::InvalidTransition(_)),
                        "{action:?} from {from}: {err:?}"
                    );
                    assert_eq!(h.status_of(app.id), from, "state must be untouched");
                }
            }
        }
    }
}

#[tokio::test]
async fn hire_twice_sends_one_email() {
    let h = Harness::new();
    let app = h.seed(ApplicationStatus::InterviewConfirmed);

    h.lifecycle.hire(h.company(), app.id).await.expect("hire");
    let again = h
        .lifecycle
        .hire(h.company(), app.id)
        .await
        .expect("second hire is a safe no-op");
    assert_eq!(again.status, ApplicationStatus::Hired);
    assert_eq!(h.gateway.count("hired"), 1);
}

#[tokio::test]
async fn deny_twice_sends_one_email() {
    let h = Harness::new();
    let app = h.seed(ApplicationStatus::InterviewScheduled);

    h.lifecycle.deny(h.company(), app.id).await.expect("deny");
    h.lifecycle
        .deny(h.company(), app.id)
        .await
        .expect("second deny is a safe no-op");
    assert_eq!(h.gateway.count("application_denied"), 1);
}

#[tokio::test]
async fn hire_after_deny_is_invalid() {
    let h = Harness::new();
    let app = h.seed(ApplicationStatus::InterviewConfirmed);
    h.lifecycle.deny(h.company(), app.id).await.expect("deny");

    let err = h
        .lifecycle
        .hire(h.company(), app.id)
        .await
        .expect_err("cannot hire a denied candidate");
    assert!(matches!(err, Error::InvalidTransition(_)));
    assert_eq!(h.status_of(app.id), ApplicationStatus::Denied);
}

#[tokio::test]
async fn confirmation_token_is_single_use() {
    let h = Harness::new();
    let app = h.submit().await;

    let pending = h
        .lifecycle
        .request_confirmation(h.company(), app.id)
        .await
        .expect("request confirmation");
    assert_eq!(pending.status, ApplicationStatus::ConfirmationPending);
    assert_eq!(h.gateway.count("confirmation_request"), 1);

    let token = h
        .store
        .get(app.id)
        .unwrap()
        .confirmation_token
        .expect("token stored");

    let confirmed = h
        .lifecycle
        .confirm_via_token(&token)
        .await
        .expect("first confirmation");
    assert_eq!(confirmed.status, ApplicationStatus::Interview);
    assert!(h.store.get(app.id).unwrap().confirmation_token.is_none());

    let err = h
        .lifecycle
        .confirm_via_token(&token)
        .await
        .expect_err("token already consumed");
    assert!(matches!(err, Error::InvalidOrExpiredToken));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let h = Harness::new();
    let app = h.seed_with(ApplicationStatus::ConfirmationPending, |a| {
        a.confirmation_token = Some("stale-token-value".to_string());
        a.token_expiry = Some(in_hours(-1));
    });

    let err = h
        .lifecycle
        .confirm_via_token("stale-token-value")
        .await
        .expect_err("expired token must not confirm");
    assert!(matches!(err, Error::InvalidOrExpiredToken));
    assert_eq!(h.status_of(app.id), ApplicationStatus::ConfirmationPending);
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let h = Harness::new();
    let err = h
        .lifecycle
        .confirm_via_token("never-issued")
        .await
        .expect_err("unknown token");
    assert!(matches!(err, Error::InvalidOrExpiredToken));
}

#[tokio::test]
async fn concurrent_hire_and_deny_have_one_winner() {
    for _ in 0..50 {
        let h = Harness::new();
        let app = h.seed(ApplicationStatus::InterviewConfirmed);

        let lifecycle = Arc::new(h.lifecycle.clone());
        let hire_task = {
            let lifecycle = lifecycle.clone();
            let company = h.company();
            let id = app.id;
            tokio::spawn(async move { lifecycle.hire(company, id).await })
        };
        let deny_task = {
            let lifecycle = lifecycle.clone();
            let company = h.company();
            let id = app.id;
            tokio::spawn(async move { lifecycle.deny(company, id).await })
        };

        let hire_result = hire_task.await.expect("join");
        let deny_result = deny_task.await.expect("join");

        let winners = [hire_result.is_ok(), deny_result.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(winners, 1, "exactly one of hire/deny must win");

        let final_status = h.status_of(app.id);
        if hire_result.is_ok() {
            assert_eq!(final_status, ApplicationStatus::Hired);
        } else {
            assert_eq!(final_status, ApplicationStatus::Denied);
        }
        assert_eq!(h.gateway.total(), 1, "only the winner emails");
    }
}

#[tokio::test]
async fn email_failure_does_not_roll_back_state() {
    let h = Harness::new();
    let app = h.submit().await;

    h.gateway.fail_next(1);
    let updated = h
        .lifecycle
        .schedule_interview(h.company(), app.id, in_hours(24))
        .await
        .expect("transition succeeds despite mailer outage");
    assert_eq!(updated.status, ApplicationStatus::InterviewScheduled);
    assert_eq!(h.gateway.total(), 0);
}

#[tokio::test]
async fn ownership_is_enforced() {
    let h = Harness::new();
    let app = h.seed(ApplicationStatus::InterviewScheduled);

    let stranger = Actor::Candidate(Uuid::new_v4());
    let err = h
        .lifecycle
        .accept_interview(stranger, app.id)
        .await
        .expect_err("other candidates cannot accept");
    assert!(matches!(err, Error::Forbidden(_)));

    let other_company = Actor::Company(Uuid::new_v4());
    let err = h
        .lifecycle
        .hire(other_company, app.id)
        .await
        .expect_err("other companies cannot hire");
    assert!(matches!(err, Error::Forbidden(_)));

    let err = h
        .lifecycle
        .submit_application(h.company(), h.new_application())
        .await
        .expect_err("companies cannot apply");
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn missing_application_is_not_found() {
    let h = Harness::new();
    let err = h
        .lifecycle
        .hire(h.company(), Uuid::new_v4())
        .await
        .expect_err("no record");
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn listings_reflect_status_and_ownership() {
    let h = Harness::new();
    let app = h.submit().await;

    let listed = h
        .lifecycle
        .list_for_job(h.company(), h.job_id)
        .await
        .expect("company listing");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, app.id);

    let mine = h
        .lifecycle
        .list_for_candidate(h.candidate(), h.candidate_id, Some(ApplicationStatus::Applied))
        .await
        .expect("candidate listing");
    assert_eq!(mine.len(), 1);

    let none = h
        .lifecycle
        .list_for_candidate(h.candidate(), h.candidate_id, Some(ApplicationStatus::Hired))
        .await
        .expect("filtered listing");
    assert!(none.is_empty());

    let err = h
        .lifecycle
        .list_for_candidate(Actor::Candidate(Uuid::new_v4()), h.candidate_id, None)
        .await
        .expect_err("cannot read someone else's applications");
    assert!(matches!(err, Error::Forbidden(_)));
}
