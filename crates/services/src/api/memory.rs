use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use assess_core::model::{
    AnswerRecord, AssessmentId, AttemptedAnswerSnapshot, ConfigId, Question, QuestionId,
    QuestionRef, SectionListing,
};

use super::types::{
    AssessmentConfig, AssessmentReport, ResultRow, SessionStateSnapshot, StartedAssessment,
};
use super::AssessmentApi;
use crate::error::ApiError;

/// Names an `AssessmentApi` operation for scripted failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    ListConfigs,
    Start,
    SessionState,
    Question,
    Submit,
    Close,
    History,
    Report,
    UploadDestination,
    Upload,
}

#[derive(Debug, Clone)]
struct StoredAssessment {
    sections: Vec<SectionListing>,
    start_time: DateTime<Utc>,
    duration_seconds: u32,
    attempted: Vec<AttemptedAnswerSnapshot>,
    submissions: Vec<(QuestionRef, AnswerRecord)>,
    closed: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    configs: Vec<AssessmentConfig>,
    templates: HashMap<ConfigId, Vec<SectionListing>>,
    assessments: HashMap<AssessmentId, StoredAssessment>,
    questions: HashMap<QuestionId, Question>,
    failures: HashMap<ApiOperation, VecDeque<ApiError>>,
    history: Vec<ResultRow>,
    reports: HashMap<AssessmentId, AssessmentReport>,
    uploads: HashMap<String, Vec<u8>>,
    next_assessment_id: u64,
    next_upload_id: u64,
    default_start_time: Option<DateTime<Utc>>,
    default_duration_seconds: u32,
}

impl MemoryState {
    fn take_failure(&mut self, operation: ApiOperation) -> Result<(), ApiError> {
        match self
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn assessment_mut(&mut self, id: AssessmentId) -> Result<&mut StoredAssessment, ApiError> {
        self.assessments.get_mut(&id).ok_or(ApiError::NotFound)
    }
}

/// Handle on a held submission; dropping it without `release` leaves the
/// submission waiting.
#[derive(Debug, Clone)]
pub struct SubmissionGate {
    notify: Arc<Notify>,
}

impl SubmissionGate {
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// Process-local `AssessmentApi` used by tests and the offline demo.
#[derive(Clone, Debug, Default)]
pub struct InMemoryAssessmentApi {
    state: Arc<Mutex<MemoryState>>,
    gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl InMemoryAssessmentApi {
    #[must_use]
    pub fn new() -> Self {
        let api = Self::default();
        if let Ok(mut state) = api.state.lock() {
            state.next_assessment_id = 1;
            state.default_duration_seconds = 30 * 60;
        }
        api
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, ApiError> {
        self.state
            .lock()
            .map_err(|_| ApiError::Transport("in-memory service lock poisoned".into()))
    }

    fn with_state<R>(&self, apply: impl FnOnce(&mut MemoryState) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut state| apply(&mut state))
    }

    /// Offers a template; starting it creates an assessment over `sections`.
    pub fn add_config(&self, config: AssessmentConfig, sections: Vec<SectionListing>) {
        self.with_state(|state| {
            state.templates.insert(config.id, sections);
            state.configs.push(config);
        });
    }

    /// Start time and duration given to assessments created by `start_assessment`.
    pub fn set_start_defaults(&self, start_time: DateTime<Utc>, duration_seconds: u32) {
        self.with_state(|state| {
            state.default_start_time = Some(start_time);
            state.default_duration_seconds = duration_seconds;
        });
    }

    pub fn insert_assessment(
        &self,
        id: AssessmentId,
        sections: Vec<SectionListing>,
        start_time: DateTime<Utc>,
        duration_seconds: u32,
    ) {
        self.with_state(|state| {
            state.assessments.insert(
                id,
                StoredAssessment {
                    sections,
                    start_time,
                    duration_seconds,
                    attempted: Vec::new(),
                    submissions: Vec::new(),
                    closed: false,
                },
            );
        });
    }

    pub fn insert_question(&self, question: Question) {
        self.with_state(|state| {
            state.questions.insert(question.id, question);
        });
    }

    pub fn seed_attempt(&self, id: AssessmentId, snapshot: AttemptedAnswerSnapshot) {
        self.with_state(|state| {
            if let Some(assessment) = state.assessments.get_mut(&id) {
                assessment.attempted.push(snapshot);
            }
        });
    }

    /// The next call to `operation` fails with `error`. Queued failures are used in order.
    pub fn fail_next(&self, operation: ApiOperation, error: ApiError) {
        self.with_state(|state| {
            state
                .failures
                .entry(operation)
                .or_default()
                .push_back(error);
        });
    }

    pub fn push_history(&self, row: ResultRow) {
        self.with_state(|state| state.history.push(row));
    }

    pub fn clear_history(&self) {
        self.with_state(|state| state.history.clear());
    }

    pub fn insert_report(&self, id: AssessmentId, report: AssessmentReport) {
        self.with_state(|state| {
            state.reports.insert(id, report);
        });
    }

    /// Holds the next submission until the returned gate is released.
    #[must_use]
    pub fn hold_next_submission(&self) -> SubmissionGate {
        let notify = Arc::new(Notify::new());
        if let Ok(mut gate) = self.gate.lock() {
            *gate = Some(Arc::clone(&notify));
        }
        SubmissionGate { notify }
    }

    #[must_use]
    pub fn submissions(&self, id: AssessmentId) -> Vec<(QuestionRef, AnswerRecord)> {
        self.with_state(|state| {
            state
                .assessments
                .get(&id)
                .map(|assessment| assessment.submissions.clone())
                .unwrap_or_default()
        })
        .unwrap_or_default()
    }

    #[must_use]
    pub fn is_closed(&self, id: AssessmentId) -> bool {
        self.with_state(|state| {
            state
                .assessments
                .get(&id)
                .is_some_and(|assessment| assessment.closed)
        })
        .unwrap_or(false)
    }

    #[must_use]
    pub fn uploaded(&self, destination: &str) -> Option<Vec<u8>> {
        self.with_state(|state| state.uploads.get(destination).cloned())
            .flatten()
    }
}

fn snapshot_of(question_id: QuestionId, answer: &AnswerRecord) -> AttemptedAnswerSnapshot {
    let mut snapshot = AttemptedAnswerSnapshot::new(question_id);
    match answer {
        AnswerRecord::SingleChoice { option_index } => {
            snapshot.single_choice = Some(i64::from(*option_index));
        }
        AnswerRecord::MultiChoice { option_indices } => {
            snapshot.multi_choice = option_indices.iter().map(|index| i64::from(*index)).collect();
        }
        AnswerRecord::FreeText { text } => snapshot.free_text = Some(text.clone()),
        AnswerRecord::Spoken { audio_url } => snapshot.audio_url = audio_url.clone(),
    }
    snapshot
}

#[async_trait]
impl AssessmentApi for InMemoryAssessmentApi {
    async fn list_assessment_configs(&self) -> Result<Vec<AssessmentConfig>, ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::ListConfigs)?;
        Ok(state.configs.clone())
    }

    async fn start_assessment(&self, config_id: ConfigId) -> Result<StartedAssessment, ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::Start)?;
        let sections = state
            .templates
            .get(&config_id)
            .cloned()
            .ok_or(ApiError::NotFound)?;

        let assessment_id = AssessmentId::new(state.next_assessment_id);
        state.next_assessment_id += 1;
        let start_time = state.default_start_time.unwrap_or_else(Utc::now);
        let duration_seconds = state.default_duration_seconds;
        state.assessments.insert(
            assessment_id,
            StoredAssessment {
                sections: sections.clone(),
                start_time,
                duration_seconds,
                attempted: Vec::new(),
                submissions: Vec::new(),
                closed: false,
            },
        );
        Ok(StartedAssessment {
            assessment_id,
            sections,
        })
    }

    async fn fetch_session_state(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<SessionStateSnapshot, ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::SessionState)?;
        let assessment = state.assessment_mut(assessment_id)?;
        Ok(SessionStateSnapshot {
            start_time: assessment.start_time,
            duration_seconds: assessment.duration_seconds,
            sections: assessment.sections.clone(),
            attempted: assessment.attempted.clone(),
        })
    }

    async fn fetch_question(
        &self,
        assessment_id: AssessmentId,
        question_id: QuestionId,
    ) -> Result<Question, ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::Question)?;
        let listed = state
            .assessment_mut(assessment_id)?
            .sections
            .iter()
            .any(|listing| listing.question_ids.contains(&question_id));
        if !listed {
            return Err(ApiError::NotFound);
        }
        state
            .questions
            .get(&question_id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn submit_answer(
        &self,
        assessment_id: AssessmentId,
        question: &QuestionRef,
        answer: &AnswerRecord,
    ) -> Result<(), ApiError> {
        let held = self.gate.lock().ok().and_then(|mut gate| gate.take());
        if let Some(notify) = held {
            notify.notified().await;
        }

        let mut state = self.lock()?;
        state.take_failure(ApiOperation::Submit)?;
        let assessment = state.assessment_mut(assessment_id)?;
        if assessment.closed {
            return Err(ApiError::Expired);
        }
        assessment
            .attempted
            .retain(|row| row.question_id != question.question_id);
        assessment
            .attempted
            .push(snapshot_of(question.question_id, answer));
        assessment
            .submissions
            .push((question.clone(), answer.clone()));
        Ok(())
    }

    async fn close_assessment(&self, assessment_id: AssessmentId) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::Close)?;
        state.assessment_mut(assessment_id)?.closed = true;
        Ok(())
    }

    async fn fetch_results_history(&self) -> Result<Vec<ResultRow>, ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::History)?;
        Ok(state.history.clone())
    }

    async fn fetch_report(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<AssessmentReport, ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::Report)?;
        state
            .reports
            .get(&assessment_id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn fetch_upload_destination(&self) -> Result<String, ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::UploadDestination)?;
        state.next_upload_id += 1;
        Ok(format!(
            "https://blob.invalid/audio/{}.wav?sig=local",
            state.next_upload_id
        ))
    }

    async fn upload_audio(&self, destination: &str, audio: Vec<u8>) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        state.take_failure(ApiOperation::Upload)?;
        state.uploads.insert(destination.to_string(), audio);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::AnswerKind;
    use assess_core::time::fixed_now;

    fn seeded() -> (InMemoryAssessmentApi, AssessmentId) {
        let api = InMemoryAssessmentApi::new();
        let id = AssessmentId::new(7);
        api.insert_assessment(
            id,
            vec![SectionListing::new("A", vec![QuestionId::new(1)])],
            fixed_now(),
            600,
        );
        api.insert_question(Question::new(QuestionId::new(1), AnswerKind::FreeText));
        (api, id)
    }

    #[tokio::test]
    async fn submission_is_reflected_in_session_state() {
        let (api, id) = seeded();
        let question = QuestionRef::new("A", QuestionId::new(1));
        let answer = AnswerRecord::FreeText {
            text: "hello".into(),
        };

        api.submit_answer(id, &question, &answer)
            .await
            .expect("submit");

        let state = api.fetch_session_state(id).await.expect("state");
        assert_eq!(state.attempted.len(), 1);
        assert_eq!(state.attempted[0].resolve(), Some(answer));
    }

    #[tokio::test]
    async fn scripted_failure_applies_once() {
        let (api, id) = seeded();
        api.fail_next(ApiOperation::SessionState, ApiError::Unauthorized);

        assert_eq!(
            api.fetch_session_state(id).await,
            Err(ApiError::Unauthorized)
        );
        assert!(api.fetch_session_state(id).await.is_ok());
    }

    #[tokio::test]
    async fn closed_assessment_rejects_answers() {
        let (api, id) = seeded();
        api.close_assessment(id).await.expect("close");
        let result = api
            .submit_answer(
                id,
                &QuestionRef::new("A", QuestionId::new(1)),
                &AnswerRecord::SingleChoice { option_index: 0 },
            )
            .await;
        assert_eq!(result, Err(ApiError::Expired));
    }

    #[tokio::test]
    async fn unlisted_question_is_not_found() {
        let (api, id) = seeded();
        api.insert_question(Question::new(QuestionId::new(99), AnswerKind::SingleChoice));
        assert_eq!(
            api.fetch_question(id, QuestionId::new(99)).await,
            Err(ApiError::NotFound)
        );
    }
}
