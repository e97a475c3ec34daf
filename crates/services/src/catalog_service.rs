use std::sync::Arc;

use assess_core::model::ConfigId;

use crate::api::{AssessmentApi, AssessmentConfig, StartedAssessment};
use crate::error::ApiError;

/// Assessment selection: what can be started, and starting it.
#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn AssessmentApi>,
}

impl CatalogService {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the configs cannot be fetched.
    pub async fn list_configs(&self) -> Result<Vec<AssessmentConfig>, ApiError> {
        self.api
            .list_assessment_configs()
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "could not list assessments"))
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the service refuses to start the assessment.
    pub async fn start(&self, config_id: ConfigId) -> Result<StartedAssessment, ApiError> {
        let started = self
            .api
            .start_assessment(config_id)
            .await
            .inspect_err(|err| tracing::warn!(%config_id, error = %err, "could not start assessment"))?;
        tracing::info!(
            %config_id,
            assessment_id = %started.assessment_id,
            sections = started.sections.len(),
            "assessment started"
        );
        Ok(started)
    }
}
