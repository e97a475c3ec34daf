use std::env;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use assess_core::model::{AnswerRecord, AssessmentId, ConfigId, Question, QuestionId, QuestionRef};

use super::types::{
    AssessmentConfig, AssessmentReport, ResultRow, SessionStateSnapshot, StartedAssessment,
};
use super::wire::{
    CloseRequest, ConfigWire, Envelope, HistoryWire, QuestionWire, ReportWire, StartRequest,
    StartWire, StateWire, SubmitRequest, UploadDestinationWire,
};
use super::AssessmentApi;
use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1/evaluation";

/// Where the assessment service lives and how to authenticate against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    /// Reads `ASSESS_API_BASE_URL` and `ASSESS_API_TOKEN`; blank values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("ASSESS_API_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let auth_token = env::var("ASSESS_API_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self {
            base_url,
            auth_token,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// `AssessmentApi` over HTTP+JSON.
#[derive(Clone)]
pub struct HttpAssessmentApi {
    client: Client,
    config: ApiConfig,
}

impl HttpAssessmentApi {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.config.endpoint(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.config.endpoint(path)))
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error = ApiError::from_status(status.as_u16());
        if error.is_unauthorized() {
            tracing::debug!(%status, url = %response.url(), "request not authorized");
        } else {
            tracing::warn!(%status, url = %response.url(), "assessment service request failed");
        }
        Err(error)
    }

    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let envelope: Envelope<T> = Self::send(request).await?.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl AssessmentApi for HttpAssessmentApi {
    async fn list_assessment_configs(&self) -> Result<Vec<AssessmentConfig>, ApiError> {
        let configs: Vec<ConfigWire> = Self::fetch(self.get("assessment-configs")).await?;
        Ok(configs.into_iter().map(AssessmentConfig::from).collect())
    }

    async fn start_assessment(&self, config_id: ConfigId) -> Result<StartedAssessment, ApiError> {
        let request = self.post("start-assessment").json(&StartRequest {
            assessment_generation_id: config_id.value(),
        });
        let started: StartWire = Self::fetch(request).await?;
        Ok(started.into())
    }

    async fn fetch_session_state(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<SessionStateSnapshot, ApiError> {
        let request = self
            .get("assessment-state")
            .query(&[("assessment_id", assessment_id.value())]);
        let state: StateWire = Self::fetch(request).await?;
        SessionStateSnapshot::try_from(state)
    }

    async fn fetch_question(
        &self,
        assessment_id: AssessmentId,
        question_id: QuestionId,
    ) -> Result<Question, ApiError> {
        let request = self.get("questions").query(&[
            ("assessment_id", assessment_id.value()),
            ("question_id", question_id.value()),
        ]);
        let question: QuestionWire = Self::fetch(request).await?;
        Question::try_from(question)
    }

    async fn submit_answer(
        &self,
        assessment_id: AssessmentId,
        question: &QuestionRef,
        answer: &AnswerRecord,
    ) -> Result<(), ApiError> {
        let body = SubmitRequest::build(assessment_id, question, answer);
        Self::send(self.post(body.path()).json(&body)).await?;
        Ok(())
    }

    async fn close_assessment(&self, assessment_id: AssessmentId) -> Result<(), ApiError> {
        let request = self.post("close-assessment").json(&CloseRequest {
            assessment_id: assessment_id.value(),
        });
        Self::send(request).await?;
        Ok(())
    }

    async fn fetch_results_history(&self) -> Result<Vec<ResultRow>, ApiError> {
        let history: HistoryWire = Self::fetch(self.get("assessment-history")).await?;
        let mut rows = Vec::with_capacity(history.attempted_list.len());
        for wire in history.attempted_list {
            match ResultRow::try_from(wire) {
                Ok(row) => rows.push(row),
                Err(err) => tracing::warn!(error = %err, "skipping unreadable result row"),
            }
        }
        Ok(rows)
    }

    async fn fetch_report(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<AssessmentReport, ApiError> {
        let request = self
            .get("fetch-report")
            .query(&[("assessmentId", assessment_id.value())]);
        let report: ReportWire = Self::fetch(request).await?;
        AssessmentReport::try_from(report)
    }

    async fn fetch_upload_destination(&self) -> Result<String, ApiError> {
        let destination: UploadDestinationWire =
            Self::send(self.get("generate-azure-storage-url"))
                .await?
                .json()
                .await?;
        Ok(destination.into_url())
    }

    async fn upload_audio(&self, destination: &str, audio: Vec<u8>) -> Result<(), ApiError> {
        // Signed URL: no bearer token.
        let request = self
            .client
            .put(destination)
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, "audio/wav")
            .body(audio);
        Self::send(request).await?;
        Ok(())
    }
}
