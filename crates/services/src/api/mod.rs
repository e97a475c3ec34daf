//! Boundary to the remote assessment service.
//!
//! Everything the session engine needs from the service goes through
//! `AssessmentApi`; the HTTP adapter talks to the real service and the
//! in-memory adapter backs tests and offline demos.

mod http;
mod memory;
mod types;
mod wire;

use async_trait::async_trait;

use assess_core::model::{AnswerRecord, AssessmentId, ConfigId, Question, QuestionId, QuestionRef};

use crate::error::ApiError;

pub use http::{ApiConfig, DEFAULT_BASE_URL, HttpAssessmentApi};
pub use memory::{ApiOperation, InMemoryAssessmentApi, SubmissionGate};
pub use types::{
    AssessmentConfig, AssessmentReport, AssessmentStatus, CategoryScore, ReportBody,
    ReportMetric, ReportSection, ResultRow, SessionStateSnapshot, StartedAssessment,
};

/// Operations consumed from the assessment service.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    /// # Errors
    ///
    /// Returns `ApiError` on transport, authorization or decode failures.
    async fn list_assessment_configs(&self) -> Result<Vec<AssessmentConfig>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` when the service refuses or cannot create the attempt.
    async fn start_assessment(&self, config_id: ConfigId) -> Result<StartedAssessment, ApiError>;

    /// Start/duration, attempted answers and the section listing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown assessment, or other `ApiError`s.
    async fn fetch_session_state(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<SessionStateSnapshot, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the question is not part of the assessment.
    async fn fetch_question(
        &self,
        assessment_id: AssessmentId,
        question_id: QuestionId,
    ) -> Result<Question, ApiError>;

    /// Sends one answer; the endpoint depends on the answer kind.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Expired` once the service stops accepting answers.
    async fn submit_answer(
        &self,
        assessment_id: AssessmentId,
        question: &QuestionRef,
        answer: &AnswerRecord,
    ) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` if the service could not close the attempt.
    async fn close_assessment(&self, assessment_id: AssessmentId) -> Result<(), ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport, authorization or decode failures.
    async fn fetch_results_history(&self) -> Result<Vec<ResultRow>, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` on transport, authorization or decode failures.
    async fn fetch_report(&self, assessment_id: AssessmentId)
    -> Result<AssessmentReport, ApiError>;

    /// A signed URL the client may PUT recorded audio to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when no destination could be issued.
    async fn fetch_upload_destination(&self) -> Result<String, ApiError>;

    /// # Errors
    ///
    /// Returns `ApiError` when the blob store rejects the upload.
    async fn upload_audio(&self, destination: &str, audio: Vec<u8>) -> Result<(), ApiError>;
}
