use assess_core::model::ConfigId;
use dioxus::prelude::*;
use dioxus_router::use_navigator;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{AssessmentCardVm, map_assessment_cards};

#[derive(Clone, Debug, PartialEq)]
struct HomeData {
    cards: Vec<AssessmentCardVm>,
}

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let catalog = ctx.catalog();
    let navigator = use_navigator();
    let mut starting = use_signal(|| None::<u64>);
    let mut start_error = use_signal(|| None::<ViewError>);

    let mut resource = use_resource(move || {
        let catalog = catalog.clone();
        async move {
            let configs = catalog
                .list_configs()
                .await
                .map_err(|err| ViewError::from(&err))?;
            Ok(HomeData {
                cards: map_assessment_cards(&configs),
            })
        }
    });

    let catalog = ctx.catalog();
    let start = use_callback(move |config_id: u64| {
        if starting.peek().is_some() {
            return;
        }
        starting.set(Some(config_id));
        start_error.set(None);
        let catalog = catalog.clone();
        spawn(async move {
            let started = catalog.start(ConfigId::new(config_id)).await;
            starting.set(None);
            match started {
                Ok(started) => match started.first_question() {
                    Some(question_id) => {
                        let _ = navigator.push(Route::Session {
                            assessment_id: started.assessment_id.value(),
                            question_id: question_id.value(),
                        });
                    }
                    None => start_error.set(Some(ViewError::Empty)),
                },
                Err(err) => start_error.set(Some(ViewError::from(&err))),
            }
        });
    });

    let state = view_state_from_resource(resource);

    rsx! {
        div { class: "page home",
            h2 { "Choose an assessment" }

            if let Some(err) = start_error() {
                p { class: "notice error", "{err.message()}" }
            }

            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(data) => rsx! {
                    if data.cards.is_empty() {
                        p { "No assessments are available right now." }
                    } else {
                        ul { class: "assessment-list",
                            for card in data.cards {
                                AssessmentCard {
                                    key: "{card.config_id}",
                                    starting: starting() == Some(card.config_id),
                                    disabled: starting().is_some(),
                                    on_start: start,
                                    card,
                                }
                            }
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "notice error", "{err.message()}" }
                    button { class: "btn", onclick: move |_| resource.restart(), "Retry" }
                },
            }
        }
    }
}

#[component]
fn AssessmentCard(
    card: AssessmentCardVm,
    starting: bool,
    disabled: bool,
    on_start: Callback<u64>,
) -> Element {
    let config_id = card.config_id;
    rsx! {
        li { class: "assessment-card",
            h3 { "{card.name}" }
            if let Some(summary) = card.summary.as_ref() {
                p { class: "summary", "{summary}" }
            }
            if !card.instructions.is_empty() {
                ol { class: "instructions",
                    for line in card.instructions.iter() {
                        li { "{line}" }
                    }
                }
            }
            button {
                class: "btn primary",
                disabled,
                onclick: move |_| on_start.call(config_id),
                if starting { "Starting..." } else { "Start" }
            }
        }
    }
}
