use std::sync::Arc;

use assess_core::model::{
    AnswerKind, AnswerRecord, AssessmentId, AttemptedAnswerSnapshot, DeadlineMonitor, ExpiryLatch,
    Question, QuestionId, QuestionRef, SectionListing,
};
use assess_core::time::fixed_now;
use chrono::Duration;
use services::api::ApiOperation;
use services::{
    ApiError, InMemoryAssessmentApi, NavigatorStatus, SessionError, SessionLoopService,
    SessionPhase, SessionSettings, SubmitOutcome, SubmitTrigger,
};

const ASSESSMENT: AssessmentId = AssessmentId::new(21);

fn q(id: u64) -> QuestionId {
    QuestionId::new(id)
}

/// Sequence `[{A,1},{A,2},{B,3}]` with question 1 already answered.
fn seeded_api() -> Arc<InMemoryAssessmentApi> {
    let api = Arc::new(InMemoryAssessmentApi::new());
    api.insert_assessment(
        ASSESSMENT,
        vec![
            SectionListing::new("A", vec![q(1), q(2)]),
            SectionListing::new("B", vec![q(3)]),
        ],
        fixed_now(),
        600,
    );
    api.insert_question(
        Question::new(q(1), AnswerKind::SingleChoice).with_options(["yes", "no"]),
    );
    api.insert_question(Question::new(q(2), AnswerKind::FreeText).with_prompt("Describe."));
    api.insert_question(
        Question::new(q(3), AnswerKind::MultiChoice).with_options(["a", "b"]),
    );

    let mut row = AttemptedAnswerSnapshot::new(q(1));
    row.single_choice = Some(0);
    api.seed_attempt(ASSESSMENT, row);
    api
}

fn service(api: &Arc<InMemoryAssessmentApi>) -> SessionLoopService {
    SessionLoopService::new(api.clone(), SessionSettings::default())
}

fn statuses(session: &services::AssessmentSession) -> Vec<NavigatorStatus> {
    session.navigator().iter().map(|entry| entry.status).collect()
}

fn words(count: usize) -> String {
    vec!["word"; count].join(" ")
}

#[tokio::test]
async fn submitting_advances_and_updates_navigator() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, None, ExpiryLatch::new())
        .await
        .unwrap();

    assert_eq!(
        statuses(&session),
        vec![
            NavigatorStatus::Current,
            NavigatorStatus::Unattempted,
            NavigatorStatus::Unattempted
        ]
    );

    assert!(loop_svc.load_current_question(&mut session).await.unwrap());
    assert!(session.select_option(1));
    let outcome = loop_svc
        .submit_current(&mut session, SubmitTrigger::User)
        .await
        .unwrap();

    assert_eq!(outcome, SubmitOutcome::Advanced(QuestionRef::new("A", q(2))));
    assert_eq!(
        statuses(&session),
        vec![
            NavigatorStatus::Attempted,
            NavigatorStatus::Current,
            NavigatorStatus::Unattempted
        ]
    );
    assert_eq!(
        session.ledger().lookup(q(1)),
        Some(&AnswerRecord::SingleChoice { option_index: 1 })
    );
    assert_eq!(api.submissions(ASSESSMENT).len(), 1);
}

#[tokio::test]
async fn last_question_asks_for_confirmation_before_ending() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, Some(q(3)), ExpiryLatch::new())
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();
    session.toggle_option(0);

    let outcome = loop_svc
        .submit_current(&mut session, SubmitTrigger::User)
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::ConfirmEnd);
    assert_eq!(session.phase(), SessionPhase::EndConfirming);
    assert!(!api.is_closed(ASSESSMENT));

    loop_svc.confirm_end(&mut session).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Ended);
    assert!(api.is_closed(ASSESSMENT));
    assert!(session.ledger().is_empty());
}

#[tokio::test]
async fn word_cap_blocks_user_submission_only() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, Some(q(2)), ExpiryLatch::new())
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();

    session.set_text(words(250));
    assert!(session.can_submit());

    session.set_text(words(251));
    assert!(!session.can_submit());
    let refused = loop_svc
        .submit_current(&mut session, SubmitTrigger::User)
        .await;
    assert!(matches!(refused, Err(SessionError::Validation(_))));
    assert_eq!(session.phase(), SessionPhase::Ready);

    loop_svc.handle_expiry(&mut session).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Ended);
    let sent = api.submissions(ASSESSMENT);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, AnswerRecord::FreeText { text: words(251) });
    assert!(api.is_closed(ASSESSMENT));
}

#[tokio::test]
async fn expiry_during_submission_ends_once_it_settles() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let latch = ExpiryLatch::new();
    let mut monitor = DeadlineMonitor::start(fixed_now(), 600, latch.clone());
    let mut session = loop_svc
        .open_session(ASSESSMENT, Some(q(2)), latch)
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();
    session.set_text("short answer");

    let gate = api.hold_next_submission();
    let submit = loop_svc.submit_current(&mut session, SubmitTrigger::User);
    let expire = async {
        tokio::task::yield_now().await;
        let tick = monitor.tick(fixed_now() + Duration::seconds(600));
        assert!(tick.expired_now);
        gate.release();
    };
    let (outcome, ()) = tokio::join!(submit, expire);

    assert_eq!(outcome.unwrap(), SubmitOutcome::Ended);
    assert_eq!(session.phase(), SessionPhase::Ended);
    assert!(api.is_closed(ASSESSMENT));
    assert_eq!(api.submissions(ASSESSMENT).len(), 1);
}

#[tokio::test]
async fn failed_submission_during_expiry_is_sent_again() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let latch = ExpiryLatch::new();
    let mut monitor = DeadlineMonitor::start(fixed_now(), 600, latch.clone());
    let mut session = loop_svc
        .open_session(ASSESSMENT, Some(q(2)), latch)
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();
    session.set_text("final answer");

    let gate = api.hold_next_submission();
    api.fail_next(ApiOperation::Submit, ApiError::Transport("offline".into()));
    let submit = loop_svc.submit_current(&mut session, SubmitTrigger::User);
    let expire = async {
        tokio::task::yield_now().await;
        assert!(monitor.tick(fixed_now() + Duration::seconds(600)).expired_now);
        gate.release();
    };
    let (outcome, ()) = tokio::join!(submit, expire);

    assert_eq!(outcome.unwrap(), SubmitOutcome::Ended);
    assert_eq!(
        api.submissions(ASSESSMENT),
        vec![(
            QuestionRef::new("A", q(2)),
            AnswerRecord::FreeText { text: "final answer".into() }
        )]
    );
    assert!(api.is_closed(ASSESSMENT));
}

#[tokio::test]
async fn answer_typed_elsewhere_during_expiry_is_sent() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, None, ExpiryLatch::new())
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();
    assert!(session.select_option(1));

    let ticket = session.begin_submit(SubmitTrigger::User).unwrap();
    session.select(q(2)).unwrap();
    assert!(loop_svc.load_current_question(&mut session).await.unwrap());
    assert!(session.set_text("second answer"));
    loop_svc.handle_expiry(&mut session).await.unwrap();

    let result = loop_svc.send(ASSESSMENT, &ticket).await;
    let outcome = session.finish_submit(ticket, result).unwrap();
    let SubmitOutcome::ForceSubmit(forced) = outcome else {
        panic!("expected the open draft to be forced, got {outcome:?}");
    };
    let result = loop_svc.send(ASSESSMENT, &forced).await;
    assert_eq!(session.finish_submit(forced, result).unwrap(), SubmitOutcome::Ending);
    let closed = loop_svc.close_remote(ASSESSMENT).await;
    session.complete_end(closed).unwrap();

    assert_eq!(session.phase(), SessionPhase::Ended);
    assert_eq!(
        api.submissions(ASSESSMENT),
        vec![
            (
                QuestionRef::new("A", q(1)),
                AnswerRecord::SingleChoice { option_index: 1 }
            ),
            (
                QuestionRef::new("A", q(2)),
                AnswerRecord::FreeText { text: "second answer".into() }
            ),
        ]
    );
    assert!(api.is_closed(ASSESSMENT));
}

#[tokio::test]
async fn expiry_is_deferred_while_a_ticket_is_out() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, Some(q(2)), ExpiryLatch::new())
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();
    session.set_text("answer");

    let ticket = session.begin_submit(SubmitTrigger::User).unwrap();
    loop_svc.handle_expiry(&mut session).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Submitting);

    let result = loop_svc.send(ASSESSMENT, &ticket).await;
    let outcome = session.finish_submit(ticket, result).unwrap();
    assert_eq!(outcome, SubmitOutcome::Ending);
    loop_svc.handle_expiry(&mut session).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Ending(services::EndReason::Expired));
}

#[tokio::test]
async fn failed_submission_keeps_draft_for_retry() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, Some(q(2)), ExpiryLatch::new())
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();
    session.set_text("keep me");

    api.fail_next(ApiOperation::Submit, ApiError::Transport("offline".into()));
    let failed = loop_svc
        .submit_current(&mut session, SubmitTrigger::User)
        .await;
    assert!(matches!(failed, Err(SessionError::Api(ApiError::Transport(_)))));
    assert_eq!(session.current(), Some(&QuestionRef::new("A", q(2))));

    let retried = loop_svc
        .submit_current(&mut session, SubmitTrigger::User)
        .await
        .unwrap();
    assert_eq!(retried, SubmitOutcome::Advanced(QuestionRef::new("B", q(3))));
}

#[tokio::test]
async fn stale_question_fetch_is_discarded() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, None, ExpiryLatch::new())
        .await
        .unwrap();

    let stale = loop_svc.fetch_question(ASSESSMENT, q(1)).await.unwrap();
    session.select(q(3)).unwrap();
    assert!(!session.attach_question(stale));
    assert!(session.question().is_none());
}

#[tokio::test]
async fn reopening_restores_answers_from_server() {
    let api = seeded_api();
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, Some(q(2)), ExpiryLatch::new())
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();
    session.set_text("persisted");
    loop_svc
        .submit_current(&mut session, SubmitTrigger::User)
        .await
        .unwrap();

    let mut reopened = loop_svc
        .open_session(ASSESSMENT, Some(q(2)), ExpiryLatch::new())
        .await
        .unwrap();
    loop_svc.load_current_question(&mut reopened).await.unwrap();
    assert_eq!(
        reopened.draft().and_then(|draft| draft.to_answer()),
        Some(AnswerRecord::FreeText {
            text: "persisted".into()
        })
    );
    assert_eq!(reopened.progress().attempted, 2);
}

#[tokio::test]
async fn spoken_answer_uploads_then_submits() {
    let api = Arc::new(InMemoryAssessmentApi::new());
    api.insert_assessment(
        ASSESSMENT,
        vec![SectionListing::new("Speaking", vec![q(8)])],
        fixed_now(),
        600,
    );
    api.insert_question(Question::new(q(8), AnswerKind::Spoken).with_prompt("Introduce yourself."));
    let loop_svc = service(&api);
    let mut session = loop_svc
        .open_session(ASSESSMENT, None, ExpiryLatch::new())
        .await
        .unwrap();
    loop_svc.load_current_question(&mut session).await.unwrap();

    let url = loop_svc
        .upload_spoken_answer(&mut session, vec![1, 2, 3])
        .await
        .unwrap();
    assert!(!url.contains('?'));

    loop_svc
        .submit_current(&mut session, SubmitTrigger::User)
        .await
        .unwrap();
    let sent = api.submissions(ASSESSMENT);
    assert_eq!(
        sent[0].1,
        AnswerRecord::Spoken {
            audio_url: Some(url)
        }
    );
}

#[tokio::test]
async fn unreachable_state_is_surfaced_not_fatal() {
    let api = seeded_api();
    api.fail_next(ApiOperation::SessionState, ApiError::NotFound);
    let loop_svc = service(&api);

    let err = loop_svc
        .open_session(ASSESSMENT, None, ExpiryLatch::new())
        .await
        .unwrap_err();
    assert!(err.notice().is_some());

    api.fail_next(ApiOperation::SessionState, ApiError::Unauthorized);
    let err = loop_svc
        .open_session(ASSESSMENT, None, ExpiryLatch::new())
        .await
        .unwrap_err();
    assert!(err.notice().is_none());
}
