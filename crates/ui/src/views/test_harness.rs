use std::sync::Arc;

use assess_core::model::{
    AnswerKind, AssessmentId, AttemptedAnswerSnapshot, ConfigId, Question, QuestionId,
    SectionListing,
};
use assess_core::time::fixed_now;
use chrono::Duration;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::api::AssessmentConfig;
use services::{AppServices, Clock, InMemoryAssessmentApi, SessionSettings};

use crate::context::{UiApp, build_app_context};
use crate::views::{HomeView, ResultsView, SessionView};

pub const ASSESSMENT: AssessmentId = AssessmentId::new(21);
pub const EXPIRED_ASSESSMENT: AssessmentId = AssessmentId::new(22);

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Results,
    Session {
        assessment_id: u64,
        question_id: u64,
    },
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<AppServices>,
    view: ViewKind,
    result_notice: bool,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    let ctx = use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    use_hook(|| {
        if props.result_notice {
            ctx.flag_result_notice();
        }
    });
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Results => rsx! { ResultsView {} },
        ViewKind::Session {
            assessment_id,
            question_id,
        } => rsx! { SessionView { assessment_id, question_id } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub api: Arc<InMemoryAssessmentApi>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuilds and lets chained resources (session, then question) resolve.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..8 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// One config, a live assessment `[{Reading,1},{Reading,2},{Writing,3}]` with
/// question 1 answered, and an assessment whose time ran out long ago.
pub fn seeded_api() -> Arc<InMemoryAssessmentApi> {
    let api = Arc::new(InMemoryAssessmentApi::new());
    let sections = vec![
        SectionListing::new("Reading", vec![QuestionId::new(1), QuestionId::new(2)]),
        SectionListing::new("Writing", vec![QuestionId::new(3)]),
    ];
    api.add_config(
        AssessmentConfig {
            id: ConfigId::new(5),
            name: "English Proficiency".to_string(),
            summary: Some("Reading and writing".to_string()),
            instructions: vec!["Answer every question".to_string()],
        },
        sections.clone(),
    );
    api.set_start_defaults(fixed_now(), 1800);
    api.insert_assessment(ASSESSMENT, sections.clone(), fixed_now(), 1800);
    api.insert_assessment(
        EXPIRED_ASSESSMENT,
        sections,
        fixed_now() - Duration::hours(2),
        1800,
    );

    api.insert_question(
        Question::new(QuestionId::new(1), AnswerKind::SingleChoice)
            .with_prompt("Which word is a noun?")
            .with_options(["quickly", "table"]),
    );
    api.insert_question(
        Question::new(QuestionId::new(2), AnswerKind::FreeText)
            .with_prompt("Describe your morning."),
    );
    api.insert_question(
        Question::new(QuestionId::new(3), AnswerKind::MultiChoice)
            .with_prompt("Pick the verbs")
            .with_options(["run", "blue", "write"]),
    );

    let mut attempt = AttemptedAnswerSnapshot::new(QuestionId::new(1));
    attempt.single_choice = Some(1);
    api.seed_attempt(ASSESSMENT, attempt);
    api
}

pub fn setup_view_harness(view: ViewKind, api: Arc<InMemoryAssessmentApi>) -> ViewHarness {
    setup_view_harness_with_notice(view, api, false)
}

pub fn setup_view_harness_with_notice(
    view: ViewKind,
    api: Arc<InMemoryAssessmentApi>,
    result_notice: bool,
) -> ViewHarness {
    let app = Arc::new(AppServices::with_api(
        api.clone(),
        Clock::fixed(fixed_now()),
        SessionSettings::default(),
    ));

    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app,
            view,
            result_notice,
        },
    );

    ViewHarness { dom, api }
}
