use std::sync::Arc;

use crate::Clock;
use crate::api::{ApiConfig, AssessmentApi, HttpAssessmentApi};
use crate::catalog_service::CatalogService;
use crate::deadline::DeadlineService;
use crate::results_service::ResultsService;
use crate::sessions::SessionLoopService;
use crate::settings::SessionSettings;

/// Assembles app-facing services over one `AssessmentApi`.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: SessionSettings,
    catalog: Arc<CatalogService>,
    session_loop: Arc<SessionLoopService>,
    deadlines: Arc<DeadlineService>,
    results: Arc<ResultsService>,
}

impl AppServices {
    /// Services talking to the remote assessment service over HTTP.
    #[must_use]
    pub fn http(config: ApiConfig, clock: Clock, settings: SessionSettings) -> Self {
        tracing::info!(base_url = %config.base_url, authenticated = config.auth_token.is_some(), "using assessment service");
        Self::with_api(Arc::new(HttpAssessmentApi::new(config)), clock, settings)
    }

    #[must_use]
    pub fn with_api(api: Arc<dyn AssessmentApi>, clock: Clock, settings: SessionSettings) -> Self {
        Self {
            clock,
            settings,
            catalog: Arc::new(CatalogService::new(Arc::clone(&api))),
            session_loop: Arc::new(SessionLoopService::new(Arc::clone(&api), settings)),
            deadlines: Arc::new(DeadlineService::new(
                Arc::clone(&api),
                clock,
                settings.fallback,
            )),
            results: Arc::new(ResultsService::new(api, clock)),
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
