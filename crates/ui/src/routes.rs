use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::views::{HomeView, ResultsView, SessionView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/assessment/:assessment_id/:question_id", SessionView)] Session { assessment_id: u64, question_id: u64 },
        #[route("/results", ResultsView)] Results {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            TopBar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn TopBar() -> Element {
    rsx! {
        nav { class: "topbar",
            h1 { "Assessments" }
            ul {
                li { Link { to: Route::Home {}, "Take an assessment" } }
                li { Link { to: Route::Results {}, "Results" } }
            }
        }
    }
}
