use assess_core::model::AnswerKind;
use dioxus::prelude::*;

use crate::vm::{DraftEdit, NavigatorCellVm, QuestionVm, SessionHeaderVm};

#[component]
pub(super) fn SessionHeader(
    header: SessionHeaderVm,
    countdown: String,
    can_navigate: bool,
    on_toggle_navigator: EventHandler<()>,
    on_request_end: EventHandler<()>,
) -> Element {
    rsx! {
        header { class: "session-header",
            div { class: "session-header__heading",
                if !header.section.is_empty() {
                    span { class: "session-header__section", "{header.section}" }
                }
                span { class: "session-header__progress", id: "session-progress", "{header.progress_label}" }
                span { class: "session-header__attempted", "{header.attempted_label}" }
            }
            span { class: "session-header__timer", id: "session-timer", "{countdown}" }
            div { class: "session-header__actions",
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| on_toggle_navigator.call(()),
                    "Questions"
                }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    disabled: !can_navigate,
                    onclick: move |_| on_request_end.call(()),
                    "End Assessment"
                }
            }
        }
    }
}

#[component]
pub(super) fn QuestionPanel(
    question: QuestionVm,
    uploading: bool,
    on_edit: EventHandler<DraftEdit>,
    on_upload: EventHandler<String>,
) -> Element {
    let mut audio_path = use_signal(String::new);
    let multi = question.kind == AnswerKind::MultiChoice;

    rsx! {
        section { class: "question", id: "question-{question.question_id}",
            if !question.passage.is_empty() {
                div { class: "question__passage",
                    for line in question.passage.iter() {
                        p { "{line}" }
                    }
                }
            }
            div { class: "question__prompt",
                for line in question.prompt.iter() {
                    p { "{line}" }
                }
            }
            for url in question.images.iter() {
                img { class: "question__image", src: "{url}" }
            }
            if let Some(hint) = question.hint.as_ref() {
                p { class: "question__hint", "{hint}" }
            }
            for sub in question.sub_questions.iter() {
                div { class: "question__sub",
                    p { "{sub.prompt}" }
                    ul {
                        for option in sub.options.iter() {
                            li { "{option}" }
                        }
                    }
                }
            }

            match question.kind {
                AnswerKind::SingleChoice | AnswerKind::MultiChoice => rsx! {
                    ul { class: "question__options",
                        for option in question.options.iter().cloned() {
                            li {
                                key: "{option.index}",
                                class: if option.selected { "option selected" } else { "option" },
                                label {
                                    input {
                                        r#type: if multi { "checkbox" } else { "radio" },
                                        name: "answer",
                                        checked: option.selected,
                                        onchange: move |_| {
                                            let edit = if multi {
                                                DraftEdit::Toggle(option.index)
                                            } else {
                                                DraftEdit::Select(option.index)
                                            };
                                            on_edit.call(edit);
                                        },
                                    }
                                    span { "{option.label}" }
                                }
                            }
                        }
                    }
                },
                AnswerKind::FreeText => rsx! {
                    textarea {
                        class: "question__text",
                        id: "answer-text",
                        rows: "10",
                        value: "{question.text}",
                        oninput: move |evt| on_edit.call(DraftEdit::Text(evt.value())),
                    }
                    p {
                        class: if question.over_limit { "word-count over" } else { "word-count" },
                        "{question.word_count_label}"
                    }
                },
                AnswerKind::Spoken => rsx! {
                    div { class: "question__audio",
                        if let Some(url) = question.audio_url.as_ref() {
                            p { class: "audio-attached", "Recording attached" }
                            audio { controls: true, src: "{url}" }
                        }
                        input {
                            r#type: "text",
                            placeholder: "Path to a .wav recording",
                            value: "{audio_path}",
                            oninput: move |evt| audio_path.set(evt.value()),
                        }
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            disabled: uploading || audio_path.read().trim().is_empty(),
                            onclick: move |_| on_upload.call(audio_path.peek().trim().to_string()),
                            if uploading { "Uploading..." } else { "Attach Recording" }
                        }
                    }
                },
            }
        }
    }
}

#[component]
pub(super) fn NavigatorOverlay(
    cells: Vec<NavigatorCellVm>,
    on_jump: EventHandler<u64>,
    on_close: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "navigator-overlay", role: "dialog",
            div { class: "navigator",
                h3 { "Questions" }
                div { class: "navigator__grid",
                    for cell in cells {
                        button {
                            key: "{cell.question_id}",
                            class: "{cell.class}",
                            r#type: "button",
                            onclick: move |_| on_jump.call(cell.question_id),
                            "{cell.label}"
                        }
                    }
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
}

#[component]
pub(super) fn EndDialog(
    closing: bool,
    on_confirm: EventHandler<()>,
    on_decline: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "end-dialog", role: "dialog", aria_modal: "true",
            h3 { "End assessment?" }
            p { "You will not be able to change your answers after ending." }
            div { class: "end-dialog__actions",
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    disabled: closing,
                    onclick: move |_| on_decline.call(()),
                    "Go back"
                }
                button {
                    class: "btn primary",
                    id: "end-confirm",
                    r#type: "button",
                    disabled: closing,
                    onclick: move |_| on_confirm.call(()),
                    if closing { "Ending..." } else { "End" }
                }
            }
        }
    }
}

#[component]
pub(super) fn TimeOverPanel(
    closed: bool,
    countdown: String,
    on_results: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "time-over", role: "dialog",
            h2 { "Time Over" }
            span { class: "session-header__timer", id: "session-timer", "{countdown}" }
            if closed {
                p { "Your answers have been submitted." }
            } else {
                p { "Submitting your answers..." }
            }
            button {
                class: "btn primary",
                r#type: "button",
                disabled: !closed,
                onclick: move |_| on_results.call(()),
                "View Results"
            }
        }
    }
}
