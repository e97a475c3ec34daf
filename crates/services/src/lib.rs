#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod catalog_service;
pub mod deadline;
pub mod error;
pub mod results_service;
pub mod sessions;
pub mod settings;

pub use assess_core::Clock;
pub use sessions as session;

pub use api::{ApiConfig, AssessmentApi, HttpAssessmentApi, InMemoryAssessmentApi};
pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use deadline::{DeadlineService, DeadlineTicker};
pub use error::{ApiError, SessionError};
pub use results_service::{RESULT_PENDING_NOTICE, ResultsService};
pub use settings::SessionSettings;

pub use sessions::{
    AssessmentSession, EndReason, ExpiryAction, NavigatorEntry, NavigatorStatus, SessionLoopService,
    SessionPhase, SessionProgress, SubmitOutcome, SubmitTicket, SubmitTrigger,
};
