use assess_core::model::{AssessmentId, Direction, ExpiryLatch, QuestionId};
use dioxus::prelude::*;
use dioxus_router::use_navigator;
use services::{
    DeadlineTicker, EndReason, ExpiryAction, SessionError, SessionPhase, SubmitOutcome,
    SubmitTicket, SubmitTrigger,
};

use super::panels::{EndDialog, NavigatorOverlay, QuestionPanel, SessionHeader, TimeOverPanel};
use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{DraftEdit, SessionVm, format_countdown};

#[component]
pub fn SessionView(assessment_id: u64, question_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let assessment_id = AssessmentId::new(assessment_id);
    let session_loop = ctx.session_loop();

    // The route's question is only the starting point; afterwards the
    // session owns the position and the route follows it.
    let initial_target = use_hook(|| QuestionId::new(question_id));
    let latch = use_hook(ExpiryLatch::new);

    let mut vm = use_signal(|| None::<SessionVm>);
    let mut notice = use_signal(|| None::<String>);
    let mut remaining = use_signal(|| None::<u32>);
    let mut expired = use_signal(|| false);
    let mut show_navigator = use_signal(|| false);
    let mut uploading = use_signal(|| false);
    let mut routed_question = use_signal(|| question_id);

    //
    // ─── ENDING ────────────────────────────────────────────────────────────────
    //

    let close_session = {
        let session_loop = session_loop.clone();
        let ctx = ctx.clone();
        use_callback(move |()| {
            let session_loop = session_loop.clone();
            let ctx = ctx.clone();
            let mut vm = vm;
            let mut notice = notice;
            spawn(async move {
                let result = session_loop.close_remote(assessment_id).await;
                let completed = vm
                    .write()
                    .as_mut()
                    .map(|vm| vm.session_mut().complete_end(result));
                match completed {
                    Some(Ok(())) => {
                        ctx.flag_result_notice();
                        if !expired() {
                            let _ = navigator.push(Route::Results {});
                        }
                    }
                    Some(Err(err)) => notice.set(err.notice()),
                    None => {}
                }
            });
        })
    };

    let force_submit = {
        let session_loop = session_loop.clone();
        use_callback(move |ticket: SubmitTicket| {
            let session_loop = session_loop.clone();
            let mut vm = vm;
            spawn(async move {
                let result = session_loop.send(assessment_id, &ticket).await;
                let outcome = vm
                    .write()
                    .as_mut()
                    .map(|vm| vm.session_mut().finish_submit(ticket, result));
                if matches!(outcome, Some(Ok(SubmitOutcome::Ending))) {
                    close_session.call(());
                }
            });
        })
    };

    let expire = use_callback(move |()| {
        expired.set(true);
        show_navigator.set(false);
        let action = vm
            .write()
            .as_mut()
            .map(|vm| vm.session_mut().on_expiry());
        match action {
            Some(ExpiryAction::ForceSubmit(ticket)) => force_submit.call(ticket),
            Some(ExpiryAction::Close) => close_session.call(()),
            Some(ExpiryAction::AwaitInFlight | ExpiryAction::Ignore) | None => {}
        }
    });

    //
    // ─── LOADING ───────────────────────────────────────────────────────────────
    //

    let open = {
        let session_loop = session_loop.clone();
        let latch = latch.clone();
        use_resource(move || {
            let session_loop = session_loop.clone();
            let latch = latch.clone();
            let mut vm = vm;
            async move {
                let session = session_loop
                    .open_session(assessment_id, Some(initial_target), latch.clone())
                    .await
                    .map_err(|err| ViewError::from(&err))?;
                vm.set(Some(SessionVm::new(session)));
                // Expiry seen before the session existed still has to end it.
                if latch.is_fired() {
                    expire.call(());
                }
                Ok::<_, ViewError>(())
            }
        })
    };

    let current_id = use_memo(move || vm.read().as_ref().and_then(SessionVm::current_question_id));

    let _question = {
        let session_loop = session_loop.clone();
        use_resource(move || {
            let session_loop = session_loop.clone();
            let target = current_id();
            let mut vm = vm;
            let mut notice = notice;
            async move {
                let Some(question_id) = target else {
                    return;
                };
                let loaded = vm.peek().as_ref().is_some_and(|vm| {
                    vm.session()
                        .question()
                        .is_some_and(|question| question.id == question_id)
                });
                if loaded {
                    return;
                }
                match session_loop.fetch_question(assessment_id, question_id).await {
                    Ok(question) => {
                        if let Some(vm) = vm.write().as_mut() {
                            vm.session_mut().attach_question(question);
                        }
                    }
                    Err(err) => notice.set(err.notice()),
                }
            }
        })
    };

    use_effect(move || {
        let Some(current) = current_id() else {
            return;
        };
        if *routed_question.peek() != current.value() {
            routed_question.set(current.value());
            let _ = navigator.replace(Route::Session {
                assessment_id: assessment_id.value(),
                question_id: current.value(),
            });
        }
    });

    let deadlines = ctx.deadlines();
    let tick_period = ctx.settings().tick_period;
    let deadline_latch = latch.clone();
    use_future(move || {
        let deadlines = deadlines.clone();
        let latch = deadline_latch.clone();
        let mut remaining = remaining;
        async move {
            let monitor = deadlines.establish(assessment_id, latch).await;
            let ticker = DeadlineTicker::spawn(monitor, deadlines.clock(), tick_period);
            let mut updates = ticker.subscribe();
            loop {
                let tick = *updates.borrow_and_update();
                remaining.set(Some(tick.remaining));
                if tick.remaining == 0 {
                    expire.call(());
                    break;
                }
                if updates.changed().await.is_err() {
                    break;
                }
            }
        }
    });

    //
    // ─── INTENTS ───────────────────────────────────────────────────────────────
    //

    let submit = {
        let session_loop = session_loop.clone();
        use_callback(move |()| {
            let begun = vm
                .write()
                .as_mut()
                .map(|vm| vm.session_mut().begin_submit(SubmitTrigger::User));
            let ticket = match begun {
                Some(Ok(ticket)) => ticket,
                Some(Err(err)) => {
                    notice.set(err.notice());
                    return;
                }
                None => return,
            };
            notice.set(None);
            let session_loop = session_loop.clone();
            let mut vm = vm;
            let mut notice = notice;
            spawn(async move {
                let result = session_loop.send(assessment_id, &ticket).await;
                let outcome = vm
                    .write()
                    .as_mut()
                    .map(|vm| vm.session_mut().finish_submit(ticket, result));
                match outcome {
                    Some(Ok(SubmitOutcome::ForceSubmit(forced))) => force_submit.call(forced),
                    Some(Ok(SubmitOutcome::Ending)) => close_session.call(()),
                    Some(Ok(_)) | None => {}
                    Some(Err(err)) => notice.set(err.notice()),
                }
            });
        })
    };

    let on_edit = use_callback(move |edit: DraftEdit| {
        if let Some(vm) = vm.write().as_mut() {
            vm.apply(edit);
        }
    });

    let on_step = use_callback(move |direction: Direction| {
        let stepped = vm.write().as_mut().map(|vm| vm.step(direction));
        if let Some(Err(err)) = stepped {
            notice.set(err.notice());
        }
    });

    let on_jump = use_callback(move |question_id: u64| {
        show_navigator.set(false);
        let jumped = vm.write().as_mut().map(|vm| vm.jump(question_id));
        if let Some(Err(err)) = jumped {
            notice.set(err.notice());
        }
    });

    let on_request_end = use_callback(move |()| {
        show_navigator.set(false);
        let requested = vm
            .write()
            .as_mut()
            .map(|vm| vm.session_mut().request_end());
        if let Some(Err(err)) = requested {
            notice.set(err.notice());
        }
    });

    let on_confirm_end = use_callback(move |()| {
        let confirmed = vm
            .write()
            .as_mut()
            .map(|vm| vm.session_mut().confirm_end());
        match confirmed {
            Some(Ok(())) => close_session.call(()),
            Some(Err(err)) => notice.set(err.notice()),
            None => {}
        }
    });

    let on_decline_end = use_callback(move |()| {
        let declined = vm
            .write()
            .as_mut()
            .map(|vm| vm.session_mut().decline_end());
        if let Some(Err(err)) = declined {
            notice.set(err.notice());
        }
    });

    let on_upload = {
        let session_loop = session_loop.clone();
        use_callback(move |path: String| {
            let session_loop = session_loop.clone();
            let mut vm = vm;
            let mut notice = notice;
            let mut uploading = uploading;
            spawn(async move {
                uploading.set(true);
                let audio = match tokio::fs::read(&path).await {
                    Ok(audio) => audio,
                    Err(err) => {
                        tracing::warn!(%path, error = %err, "recording unreadable");
                        notice.set(Some("Could not read the recording.".to_string()));
                        uploading.set(false);
                        return;
                    }
                };
                match session_loop.upload_audio(audio).await {
                    Ok(url) => {
                        if let Some(vm) = vm.write().as_mut() {
                            vm.session_mut().set_audio_url(Some(url));
                        }
                        notice.set(None);
                    }
                    Err(err) => notice.set(SessionError::from(err).notice()),
                }
                uploading.set(false);
            });
        })
    };

    let on_results = use_callback(move |()| {
        ctx.flag_result_notice();
        let _ = navigator.push(Route::Results {});
    });

    //
    // ─── RENDER ────────────────────────────────────────────────────────────────
    //

    let state = view_state_from_resource(open);
    let countdown = format_countdown(remaining());
    let (header, question, cells, phase, can_submit, can_navigate, submit_label) = {
        let guard = vm.read();
        let vm = guard.as_ref();
        (
            vm.map(SessionVm::header),
            vm.and_then(SessionVm::question),
            vm.map(SessionVm::navigator).unwrap_or_default(),
            vm.map(SessionVm::phase),
            vm.is_some_and(SessionVm::can_submit),
            vm.is_some_and(SessionVm::can_navigate),
            vm.map_or("Submit & Next", SessionVm::submit_label),
        )
    };
    let confirming = matches!(
        phase,
        Some(SessionPhase::EndConfirming | SessionPhase::Ending(EndReason::Confirmed))
    );
    let closing = phase == Some(SessionPhase::Ending(EndReason::Confirmed));

    rsx! {
        div { class: "page session-page",
            if expired() {
                TimeOverPanel {
                    closed: phase == Some(SessionPhase::Ended)
                        || matches!(state, ViewState::Error(_)),
                    countdown: format_countdown(Some(0)),
                    on_results,
                }
            } else {
                match state {
                    ViewState::Idle => rsx! {
                        p { "Idle" }
                    },
                    ViewState::Loading => rsx! {
                        p { "Loading..." }
                    },
                    ViewState::Error(err) => rsx! {
                        p { class: "notice error", "{err.message()}" }
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| {
                                let mut open = open;
                                open.restart();
                            },
                            "Retry"
                        }
                    },
                    ViewState::Ready(()) => rsx! {
                        if let Some(header) = header {
                            SessionHeader {
                                header,
                                countdown,
                                can_navigate,
                                on_toggle_navigator: move |()| {
                                    let open = show_navigator();
                                    show_navigator.set(!open);
                                },
                                on_request_end,
                            }
                        }
                        if let Some(message) = notice() {
                            p { class: "notice", id: "session-notice", "{message}" }
                        }
                        if let Some(question) = question {
                            QuestionPanel {
                                question,
                                uploading: uploading(),
                                on_edit,
                                on_upload,
                            }
                        } else if !confirming {
                            p { class: "question-loading", "Loading question..." }
                        }
                        footer { class: "session-footer",
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                disabled: !can_navigate,
                                onclick: move |_| on_step.call(Direction::Previous),
                                "Previous"
                            }
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                disabled: !can_navigate,
                                onclick: move |_| on_step.call(Direction::Next),
                                "Next"
                            }
                            button {
                                class: "btn primary",
                                id: "session-submit",
                                r#type: "button",
                                disabled: !can_submit,
                                onclick: move |_| submit.call(()),
                                "{submit_label}"
                            }
                        }
                        if confirming {
                            EndDialog {
                                closing,
                                on_confirm: on_confirm_end,
                                on_decline: on_decline_end,
                            }
                        }
                        if show_navigator() {
                            NavigatorOverlay {
                                cells,
                                on_jump,
                                on_close: move |()| show_navigator.set(false),
                            }
                        }
                    },
                }
            }
        }
    }
}
