mod navigator;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use navigator::{NavigatorEntry, NavigatorStatus, project as project_navigator};
pub use progress::SessionProgress;
pub use service::{
    AssessmentSession, EndReason, ExpiryAction, SessionPhase, SubmitOutcome, SubmitTicket,
    SubmitTrigger,
};
pub use workflow::{SessionLoopService, public_audio_url};
