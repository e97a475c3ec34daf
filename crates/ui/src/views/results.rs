use assess_core::model::AssessmentId;
use dioxus::prelude::*;
use services::RESULT_PENDING_NOTICE;

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{ReportVm, ResultRowVm, map_report, map_result_rows};

#[derive(Clone, Debug, PartialEq)]
struct ResultsData {
    rows: Vec<ResultRowVm>,
}

#[component]
pub fn ResultsView() -> Element {
    let ctx = use_context::<AppContext>();
    let show_notice = use_hook(|| ctx.take_result_notice());
    let results = ctx.results();
    let poll_period = ctx.settings().results_poll_period;

    let mut refresh = use_signal(|| 0_u32);
    let mut polling = use_signal(|| false);
    let mut selected = use_signal(|| None::<u64>);

    let resource = {
        let results = results.clone();
        use_resource(move || {
            let results = results.clone();
            let _generation = refresh();
            let mut polling = polling;
            async move {
                let rows = results
                    .history()
                    .await
                    .map_err(|err| ViewError::from(&err))?;
                polling.set(results.should_poll(&rows));
                Ok::<_, ViewError>(ResultsData {
                    rows: map_result_rows(&rows),
                })
            }
        })
    };

    // Rows still being evaluated today are refreshed until they settle.
    use_future(move || async move {
        loop {
            tokio::time::sleep(poll_period).await;
            if *polling.peek() {
                refresh.with_mut(|generation| *generation = generation.wrapping_add(1));
            }
        }
    });

    let report = use_resource(move || {
        let results = results.clone();
        let target = selected();
        async move {
            let Some(assessment_id) = target else {
                return Ok(None);
            };
            let report = results
                .report(AssessmentId::new(assessment_id))
                .await
                .map_err(|err| ViewError::from(&err))?;
            Ok::<_, ViewError>(Some(map_report(&report)))
        }
    });

    let state = view_state_from_resource(resource);
    let report_state = view_state_from_resource(report);

    rsx! {
        div { class: "page results",
            h2 { "Results" }

            if show_notice {
                p { class: "notice", id: "result-notice", "{RESULT_PENDING_NOTICE}" }
            }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => rsx! {
                    if data.rows.is_empty() {
                        p { "No assessments taken yet." }
                    } else {
                        table { class: "results-table",
                            thead {
                                tr {
                                    th { "Assessment" }
                                    th { "Status" }
                                    th { "Attempted" }
                                    th { "Score" }
                                    th { "Percentage" }
                                    th {}
                                }
                            }
                            tbody {
                                for row in data.rows {
                                    ResultRow {
                                        key: "{row.assessment_id}",
                                        on_open: move |assessment_id| selected.set(Some(assessment_id)),
                                        row,
                                    }
                                }
                            }
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "notice error", "{err.message()}" }
                    button {
                        class: "btn btn-secondary",
                        onclick: move |_| refresh.with_mut(|generation| *generation = generation.wrapping_add(1)),
                        "Retry"
                    }
                },
            }

            match report_state {
                ViewState::Ready(Some(report)) => rsx! {
                    ReportPanel { report, on_close: move |()| selected.set(None) }
                },
                ViewState::Loading => rsx! {
                    p { class: "report-loading", "Loading report..." }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "notice error", "{err.message()}" }
                },
                ViewState::Ready(None) | ViewState::Idle => rsx! {},
            }
        }
    }
}

#[component]
fn ResultRow(row: ResultRowVm, on_open: EventHandler<u64>) -> Element {
    let assessment_id = row.assessment_id;
    rsx! {
        tr {
            td { "{row.name}" }
            td { class: "status", "{row.status_label}" }
            td { "{row.attempted_label}" }
            td { "{row.score_label}" }
            td { "{row.percentage_label}" }
            td {
                if row.has_report {
                    button {
                        class: "btn btn-link",
                        r#type: "button",
                        onclick: move |_| on_open.call(assessment_id),
                        "View report"
                    }
                }
            }
        }
    }
}

#[component]
fn ReportPanel(report: ReportVm, on_close: EventHandler<()>) -> Element {
    rsx! {
        section { class: "report",
            match report {
                ReportVm::Pending { status_label } => rsx! {
                    p { "The report is not ready yet ({status_label})." }
                },
                ReportVm::Ready { title, score_label, feedback, categories, sections } => rsx! {
                    h3 { "{title}" }
                    p { class: "report__score", "Score: {score_label}" }
                    for line in feedback {
                        p { class: "report__feedback", "{line}" }
                    }
                    if !categories.is_empty() {
                        ul { class: "report__categories",
                            for category in categories {
                                li { "{category.label}: {category.value}" }
                            }
                        }
                    }
                    for section in sections {
                        div { class: "report__section",
                            h4 { "{section.name}" }
                            ul {
                                for metric in section.metrics {
                                    li { "{metric.label}: {metric.value}" }
                                }
                            }
                        }
                    }
                },
            }
            button {
                class: "btn btn-secondary",
                r#type: "button",
                onclick: move |_| on_close.call(()),
                "Close"
            }
        }
    }
}
