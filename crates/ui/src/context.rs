use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use services::{
    AppServices, CatalogService, Clock, DeadlineService, ResultsService, SessionLoopService,
    SessionSettings,
};

pub trait UiApp: Send + Sync {
    fn clock(&self) -> Clock;
    fn settings(&self) -> SessionSettings;

    fn catalog(&self) -> Arc<CatalogService>;
    fn session_loop(&self) -> Arc<SessionLoopService>;
    fn deadlines(&self) -> Arc<DeadlineService>;
    fn results(&self) -> Arc<ResultsService>;
}

impl UiApp for AppServices {
    fn clock(&self) -> Clock {
        AppServices::clock(self)
    }

    fn settings(&self) -> SessionSettings {
        AppServices::settings(self)
    }

    fn catalog(&self) -> Arc<CatalogService> {
        AppServices::catalog(self)
    }

    fn session_loop(&self) -> Arc<SessionLoopService> {
        AppServices::session_loop(self)
    }

    fn deadlines(&self) -> Arc<DeadlineService> {
        AppServices::deadlines(self)
    }

    fn results(&self) -> Arc<ResultsService> {
        AppServices::results(self)
    }
}

#[derive(Clone)]
pub struct AppContext {
    clock: Clock,
    settings: SessionSettings,
    result_notice_once: Arc<AtomicBool>,

    catalog: Arc<CatalogService>,
    session_loop: Arc<SessionLoopService>,
    deadlines: Arc<DeadlineService>,
    results: Arc<ResultsService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            clock: app.clock(),
            settings: app.settings(),
            result_notice_once: Arc::new(AtomicBool::new(false)),
            catalog: app.catalog(),
            session_loop: app.session_loop(),
            deadlines: app.deadlines(),
            results: app.results(),
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Arms the "result will appear shortly" notice for the next results visit.
    pub fn flag_result_notice(&self) {
        self.result_notice_once.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn take_result_notice(&self) -> bool {
        self.result_notice_once.swap(false, Ordering::AcqRel)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn deadlines(&self) -> Arc<DeadlineService> {
        Arc::clone(&self.deadlines)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
