//! JSON shapes exchanged with the assessment service, and their conversion
//! into domain types.
//!
//! The service is loose about scalar types (section names arrive as numbers
//! or strings, durations as seconds or clock text), so every such field goes
//! through `Lenient`.

use serde::{Deserialize, Serialize};

use assess_core::model::{
    AnswerKind, AnswerRecord, AssessmentId, AttemptedAnswerSnapshot, ConfigId, Question,
    QuestionId, QuestionRef, SectionListing, SubQuestion,
};
use assess_core::time::parse_timestamp;

use super::types::{
    AssessmentConfig, AssessmentReport, AssessmentStatus, CategoryScore, ReportBody,
    ReportMetric, ReportSection, ResultRow, SessionStateSnapshot, StartedAssessment,
};
use crate::error::ApiError;

/// Every response body is wrapped in `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum Lenient {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Lenient {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Lenient::Int(value) => Some(*value),
            Lenient::Float(_) => None,
            Lenient::Text(text) => text.trim().parse().ok(),
        }
    }

    fn as_text(&self) -> String {
        match self {
            Lenient::Int(value) => value.to_string(),
            Lenient::Float(value) => value.to_string(),
            Lenient::Text(text) => text.clone(),
        }
    }

    /// Seconds, from a number or from `[D ]HH:MM:SS` text.
    fn as_duration_secs(&self) -> Option<u32> {
        match self {
            Lenient::Int(value) => u32::try_from(*value).ok(),
            Lenient::Float(value) if *value >= 0.0 && value.is_finite() => {
                u32::try_from(value.floor() as u64).ok()
            }
            Lenient::Float(_) => None,
            Lenient::Text(text) => parse_duration_text(text),
        }
    }
}

fn parse_duration_text(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let (days, clock) = match raw.split_once(' ') {
        Some((days, rest)) => (days.trim().parse::<u64>().ok()?, rest.trim()),
        None => (0, raw),
    };

    let mut seconds = 0.0_f64;
    for part in clock.split(':') {
        let value: f64 = part.trim().parse().ok()?;
        if value < 0.0 || !value.is_finite() {
            return None;
        }
        seconds = seconds * 60.0 + value;
    }
    if seconds > f64::from(u32::MAX) {
        return None;
    }

    let total = days
        .checked_mul(86_400)?
        .checked_add(seconds.floor() as u64)?;
    u32::try_from(total).ok()
}

//
// ─── LISTINGS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct SectionWire {
    section: Lenient,
    #[serde(default)]
    questions: Vec<u64>,
}

impl From<SectionWire> for SectionListing {
    fn from(wire: SectionWire) -> Self {
        SectionListing::new(
            wire.section.as_text(),
            wire.questions.into_iter().map(QuestionId::new).collect(),
        )
    }
}

fn listings(sections: Vec<SectionWire>) -> Vec<SectionListing> {
    sections.into_iter().map(SectionListing::from).collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigWire {
    assessment_generation_id: u64,
    name: String,
    #[serde(default)]
    instructions: Option<InstructionsWire>,
}

#[derive(Debug, Default, Deserialize)]
struct InstructionsWire {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    list: Vec<String>,
}

impl From<ConfigWire> for AssessmentConfig {
    fn from(wire: ConfigWire) -> Self {
        let instructions = wire.instructions.unwrap_or_default();
        AssessmentConfig {
            id: ConfigId::new(wire.assessment_generation_id),
            name: wire.name,
            summary: instructions.content.filter(|text| !text.trim().is_empty()),
            instructions: instructions.list,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartWire {
    assessment_id: u64,
    #[serde(default)]
    questions: Vec<SectionWire>,
}

impl From<StartWire> for StartedAssessment {
    fn from(wire: StartWire) -> Self {
        StartedAssessment {
            assessment_id: AssessmentId::new(wire.assessment_id),
            sections: listings(wire.questions),
        }
    }
}

//
// ─── SESSION STATE ────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct StateWire {
    start_time: String,
    test_duration: Lenient,
    #[serde(default)]
    question_list: Vec<SectionWire>,
    #[serde(default)]
    attempted_questions: Vec<AttemptWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptWire {
    question_id: u64,
    #[serde(default)]
    mcq_answer: Option<Lenient>,
    #[serde(default)]
    multiple_mcq_answer: Option<Vec<i64>>,
    #[serde(default)]
    answer_text: Option<String>,
    #[serde(default)]
    answer_audio_url: Option<String>,
}

impl From<AttemptWire> for AttemptedAnswerSnapshot {
    fn from(wire: AttemptWire) -> Self {
        AttemptedAnswerSnapshot {
            question_id: QuestionId::new(wire.question_id),
            free_text: wire.answer_text,
            multi_choice: wire.multiple_mcq_answer.unwrap_or_default(),
            audio_url: wire.answer_audio_url,
            single_choice: wire.mcq_answer.as_ref().and_then(Lenient::as_i64),
        }
    }
}

impl TryFrom<StateWire> for SessionStateSnapshot {
    type Error = ApiError;

    fn try_from(wire: StateWire) -> Result<Self, Self::Error> {
        let start_time = parse_timestamp(&wire.start_time)
            .map_err(|err| ApiError::from(assess_core::Error::from(err)))?;
        let duration_seconds = wire.test_duration.as_duration_secs().ok_or_else(|| {
            ApiError::Decode(format!(
                "unreadable test_duration {:?}",
                wire.test_duration.as_text()
            ))
        })?;

        Ok(SessionStateSnapshot {
            start_time,
            duration_seconds,
            sections: listings(wire.question_list),
            attempted: wire
                .attempted_questions
                .into_iter()
                .map(AttemptedAnswerSnapshot::from)
                .collect(),
        })
    }
}

//
// ─── QUESTION CONTENT ─────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionWire {
    question_id: u64,
    answer_type: Option<u8>,
    question: Option<String>,
    paragraph: Option<String>,
    options: Option<Vec<String>>,
    questions: Option<Vec<SubQuestionWire>>,
    image_url: Option<ImageUrlWire>,
    hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubQuestionWire {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageUrlWire {
    One(String),
    Many(Vec<String>),
}

impl ImageUrlWire {
    fn into_urls(self) -> Vec<String> {
        let urls = match self {
            ImageUrlWire::One(url) => vec![url],
            ImageUrlWire::Many(urls) => urls,
        };
        urls.into_iter()
            .filter(|url| !url.trim().is_empty())
            .collect()
    }
}

impl TryFrom<QuestionWire> for Question {
    type Error = ApiError;

    fn try_from(wire: QuestionWire) -> Result<Self, Self::Error> {
        let code = wire.answer_type.ok_or_else(|| {
            ApiError::Decode(format!("question {} has no answer_type", wire.question_id))
        })?;
        let kind = AnswerKind::from_code(code)
            .map_err(|err| ApiError::from(assess_core::Error::from(err)))?;

        Ok(Question {
            id: QuestionId::new(wire.question_id),
            kind,
            prompt: wire.question.filter(|text| !text.trim().is_empty()),
            paragraph: wire.paragraph.filter(|text| !text.trim().is_empty()),
            options: wire.options.unwrap_or_default(),
            sub_questions: wire
                .questions
                .unwrap_or_default()
                .into_iter()
                .map(|sub| SubQuestion {
                    prompt: sub.question,
                    options: sub.options,
                })
                .collect(),
            image_urls: wire.image_url.map(ImageUrlWire::into_urls).unwrap_or_default(),
            hint: wire.hint.filter(|text| !text.trim().is_empty()),
        })
    }
}

//
// ─── RESULTS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryWire {
    #[serde(default)]
    pub attempted_list: Vec<ResultRowWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultRowWire {
    assessment_id: u64,
    #[serde(default)]
    assessment_name: Option<String>,
    status: u8,
    #[serde(default)]
    last_attempted: Option<String>,
    #[serde(default)]
    total_obtained: Option<f64>,
    #[serde(default)]
    grand_total: Option<f64>,
    #[serde(default)]
    percentage: Option<Lenient>,
}

impl TryFrom<ResultRowWire> for ResultRow {
    type Error = ApiError;

    fn try_from(wire: ResultRowWire) -> Result<Self, Self::Error> {
        let status = AssessmentStatus::from_code(wire.status).ok_or_else(|| {
            ApiError::Decode(format!(
                "assessment {} has unknown status {}",
                wire.assessment_id, wire.status
            ))
        })?;
        Ok(ResultRow {
            assessment_id: AssessmentId::new(wire.assessment_id),
            assessment_name: wire.assessment_name.unwrap_or_default(),
            status,
            last_attempted: wire
                .last_attempted
                .as_deref()
                .and_then(|raw| parse_timestamp(raw).ok()),
            total_obtained: wire.total_obtained,
            grand_total: wire.grand_total,
            percentage: wire.percentage.as_ref().map(Lenient::as_text),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportWire {
    #[serde(default)]
    data: Option<ReportBodyWire>,
    status: u8,
}

#[derive(Debug, Deserialize)]
struct ReportBodyWire {
    assessment_info: ReportInfoWire,
    performance_overview: ReportOverviewWire,
    #[serde(default)]
    performance_metrics: Vec<CategoryWire>,
    #[serde(default)]
    sections: Vec<ReportSectionWire>,
}

#[derive(Debug, Deserialize)]
struct ReportInfoWire {
    #[serde(default)]
    assessment_name: String,
}

#[derive(Debug, Deserialize)]
struct ReportOverviewWire {
    #[serde(default)]
    feedback: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct CategoryWire {
    category: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct ReportSectionWire {
    name: String,
    #[serde(default)]
    metrics: Vec<MetricWire>,
}

#[derive(Debug, Deserialize)]
struct MetricWire {
    name: String,
    #[serde(default)]
    total_score: f64,
    obtained_score: Lenient,
}

impl TryFrom<ReportWire> for AssessmentReport {
    type Error = ApiError;

    fn try_from(wire: ReportWire) -> Result<Self, Self::Error> {
        let status = AssessmentStatus::from_code(wire.status)
            .ok_or_else(|| ApiError::Decode(format!("unknown report status {}", wire.status)))?;
        let body = wire.data.map(|body| ReportBody {
            assessment_name: body.assessment_info.assessment_name,
            score: body.performance_overview.score,
            feedback: body.performance_overview.feedback,
            categories: body
                .performance_metrics
                .into_iter()
                .map(|metric| CategoryScore {
                    category: metric.category,
                    score: metric.score,
                })
                .collect(),
            sections: body
                .sections
                .into_iter()
                .map(|section| ReportSection {
                    name: section.name,
                    metrics: section
                        .metrics
                        .into_iter()
                        .map(|metric| ReportMetric {
                            name: metric.name,
                            total_score: metric.total_score,
                            obtained_score: metric.obtained_score.as_text(),
                        })
                        .collect(),
                })
                .collect(),
        });
        Ok(AssessmentReport { status, body })
    }
}

/// The storage-url endpoint has answered both bare and wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UploadDestinationWire {
    Wrapped { data: UploadUrlWire },
    Direct(UploadUrlWire),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UploadUrlWire {
    Plain(String),
    Object { url: String },
}

impl UploadDestinationWire {
    pub(crate) fn into_url(self) -> String {
        let inner = match self {
            UploadDestinationWire::Wrapped { data } | UploadDestinationWire::Direct(data) => data,
        };
        match inner {
            UploadUrlWire::Plain(url) | UploadUrlWire::Object { url } => url,
        }
    }
}

//
// ─── REQUEST BODIES ───────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct StartRequest {
    pub assessment_generation_id: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CloseRequest {
    pub assessment_id: u64,
}

const SINGLE_CHOICE_SECTION: u8 = 1;
const FREE_TEXT_SECTION: u8 = 2;
const MULTI_CHOICE_SECTION: u8 = 3;

/// Body of an answer submission. Each kind has its own endpoint.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum SubmitRequest {
    SingleChoice {
        assessment_id: u64,
        question_id: u64,
        mcq_answer: String,
        section: u8,
    },
    MultiChoice {
        assessment_id: u64,
        question_id: u64,
        multiple_mcq_answer: Vec<u32>,
        section: u8,
    },
    FreeText {
        assessment_id: u64,
        question_id: u64,
        answer_text: String,
        section: u8,
    },
    /// The audio itself is uploaded beforehand; this only marks the question answered.
    Spoken {
        assessment_id: u64,
        question_id: u64,
    },
}

impl SubmitRequest {
    pub(crate) fn build(
        assessment_id: AssessmentId,
        question: &QuestionRef,
        answer: &AnswerRecord,
    ) -> Self {
        let assessment_id = assessment_id.value();
        let question_id = question.question_id.value();
        match answer {
            AnswerRecord::SingleChoice { option_index } => SubmitRequest::SingleChoice {
                assessment_id,
                question_id,
                mcq_answer: option_index.to_string(),
                section: SINGLE_CHOICE_SECTION,
            },
            AnswerRecord::MultiChoice { option_indices } => SubmitRequest::MultiChoice {
                assessment_id,
                question_id,
                multiple_mcq_answer: option_indices.iter().copied().collect(),
                section: MULTI_CHOICE_SECTION,
            },
            AnswerRecord::FreeText { text } => SubmitRequest::FreeText {
                assessment_id,
                question_id,
                answer_text: text.clone(),
                section: FREE_TEXT_SECTION,
            },
            AnswerRecord::Spoken { .. } => SubmitRequest::Spoken {
                assessment_id,
                question_id,
            },
        }
    }

    pub(crate) fn path(&self) -> &'static str {
        match self {
            SubmitRequest::SingleChoice { .. } => "submit-assessment-answer-mcq",
            SubmitRequest::MultiChoice { .. } => "submit-assessment-answer-mmcq",
            SubmitRequest::FreeText { .. } => "submit-assessment-answer-subjective",
            SubmitRequest::Spoken { .. } => "submit-assessment-answer-voice",
        }
    }
}
