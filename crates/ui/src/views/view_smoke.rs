use assess_core::model::AssessmentId;
use services::ApiError;
use services::api::{ApiOperation, AssessmentStatus, ResultRow};

use super::test_harness::{
    ASSESSMENT, EXPIRED_ASSESSMENT, ViewKind, seeded_api, setup_view_harness,
    setup_view_harness_with_notice,
};

fn row(id: u64, name: &str, status: AssessmentStatus) -> ResultRow {
    ResultRow {
        assessment_id: AssessmentId::new(id),
        assessment_name: name.to_string(),
        status,
        last_attempted: None,
        total_obtained: Some(18.0),
        grand_total: Some(20.0),
        percentage: Some("90".to_string()),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_lists_configs() {
    let mut harness = setup_view_harness(ViewKind::Home, seeded_api());

    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("English Proficiency"), "missing name in {html}");
    assert!(html.contains("Reading and writing"), "missing summary in {html}");
    assert!(html.contains("Answer every question"), "missing instructions in {html}");
    assert!(html.contains("Start"), "missing start button in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_renders_error_state() {
    let api = seeded_api();
    api.fail_next(
        ApiOperation::ListConfigs,
        ApiError::Transport("connection refused".to_string()),
    );
    let mut harness = setup_view_harness(ViewKind::Home, api);

    harness.settle().await;
    let html = harness.render();

    assert!(
        html.contains("Could not reach the assessment service"),
        "missing error in {html}"
    );
    assert!(html.contains("Retry"), "missing retry in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn results_view_smoke_renders_rows_and_notice() {
    let api = seeded_api();
    api.push_history(row(7, "Grammar Check", AssessmentStatus::Completed));
    api.push_history(row(8, "Listening", AssessmentStatus::EvaluationPending));
    let mut harness = setup_view_harness_with_notice(ViewKind::Results, api, true);

    harness.settle().await;
    let html = harness.render();

    assert!(
        html.contains("Your assessment result will appear here shortly"),
        "missing notice in {html}"
    );
    assert!(html.contains("Grammar Check"), "missing row in {html}");
    assert!(html.contains("Evaluation Pending"), "missing status in {html}");
    assert!(html.contains("18 / 20"), "missing score in {html}");
    assert!(html.contains("View report"), "missing report link in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn results_view_smoke_hides_notice_when_not_flagged() {
    let mut harness = setup_view_harness(ViewKind::Results, seeded_api());

    harness.settle().await;
    let html = harness.render();

    assert!(!html.contains("will appear here shortly"), "unexpected notice in {html}");
    assert!(html.contains("No assessments taken yet."), "missing empty state in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn session_view_smoke_renders_first_question() {
    let mut harness = setup_view_harness(
        ViewKind::Session {
            assessment_id: ASSESSMENT.value(),
            question_id: 1,
        },
        seeded_api(),
    );

    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Which word is a noun?"), "missing prompt in {html}");
    assert!(html.contains("1 / 3"), "missing progress in {html}");
    assert!(html.contains("1 of 3 answered"), "missing attempted count in {html}");
    assert!(html.contains("30:00"), "missing countdown in {html}");
    assert!(html.contains("option selected"), "previous answer not restored in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn session_view_smoke_opens_requested_question() {
    let mut harness = setup_view_harness(
        ViewKind::Session {
            assessment_id: ASSESSMENT.value(),
            question_id: 3,
        },
        seeded_api(),
    );

    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Pick the verbs"), "missing prompt in {html}");
    assert!(html.contains("3 / 3"), "missing progress in {html}");
    assert!(html.contains("Writing"), "missing section in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn session_view_smoke_shows_time_over_for_expired_attempt() {
    let api = seeded_api();
    let mut harness = setup_view_harness(
        ViewKind::Session {
            assessment_id: EXPIRED_ASSESSMENT.value(),
            question_id: 1,
        },
        api.clone(),
    );

    harness.settle().await;
    let html = harness.render();

    assert!(html.contains("Time Over"), "missing time over panel in {html}");
    assert!(html.contains("00:00"), "missing zero countdown in {html}");
    assert!(html.contains("Your answers have been submitted."), "close not applied in {html}");
    assert!(api.is_closed(EXPIRED_ASSESSMENT));
    assert!(api.submissions(EXPIRED_ASSESSMENT).is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn session_view_smoke_renders_not_found() {
    let mut harness = setup_view_harness(
        ViewKind::Session {
            assessment_id: 404,
            question_id: 1,
        },
        seeded_api(),
    );

    harness.settle().await;
    let html = harness.render();

    assert!(
        html.contains("This assessment could not be found."),
        "missing error in {html}"
    );
}
