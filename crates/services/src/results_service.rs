use std::sync::Arc;

use chrono::NaiveDate;

use assess_core::model::AssessmentId;

use crate::Clock;
use crate::api::{AssessmentApi, AssessmentReport, AssessmentStatus, ResultRow};
use crate::error::ApiError;

/// Shown on the results listing right after a session ends.
pub const RESULT_PENDING_NOTICE: &str = "Your assessment result will appear here shortly";

/// True while an attempt from today is still being evaluated.
#[must_use]
pub fn should_poll(rows: &[ResultRow], today: NaiveDate) -> bool {
    rows.iter().any(|row| {
        row.status == AssessmentStatus::EvaluationPending
            && row
                .last_attempted
                .is_some_and(|at| at.date_naive() == today)
    })
}

#[derive(Clone)]
pub struct ResultsService {
    api: Arc<dyn AssessmentApi>,
    clock: Clock,
}

impl ResultsService {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>, clock: Clock) -> Self {
        Self { api, clock }
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the history cannot be fetched.
    pub async fn history(&self) -> Result<Vec<ResultRow>, ApiError> {
        self.api.fetch_results_history().await.inspect_err(|err| {
            if !err.is_unauthorized() {
                tracing::warn!(error = %err, "could not load results");
            }
        })
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the report cannot be fetched.
    pub async fn report(&self, assessment_id: AssessmentId) -> Result<AssessmentReport, ApiError> {
        self.api.fetch_report(assessment_id).await
    }

    #[must_use]
    pub fn should_poll(&self, rows: &[ResultRow]) -> bool {
        should_poll(rows, self.clock.now().date_naive())
    }
}
