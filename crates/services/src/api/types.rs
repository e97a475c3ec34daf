use chrono::{DateTime, Utc};

use assess_core::model::{
    AssessmentId, AttemptedAnswerSnapshot, ConfigId, OrderedSequence, QuestionId, SectionListing,
};

/// An assessment template offered on the selection screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentConfig {
    pub id: ConfigId,
    pub name: String,
    pub summary: Option<String>,
    pub instructions: Vec<String>,
}

/// A freshly created attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedAssessment {
    pub assessment_id: AssessmentId,
    pub sections: Vec<SectionListing>,
}

impl StartedAssessment {
    /// Where a new session should open.
    #[must_use]
    pub fn first_question(&self) -> Option<QuestionId> {
        OrderedSequence::build(&self.sections)
            .first()
            .map(|question| question.question_id)
    }
}

/// Server-authoritative state of a running attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStateSnapshot {
    pub start_time: DateTime<Utc>,
    pub duration_seconds: u32,
    pub sections: Vec<SectionListing>,
    pub attempted: Vec<AttemptedAnswerSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentStatus {
    CreationPending,
    InProgress,
    Completed,
    EvaluationPending,
    Abandoned,
}

impl AssessmentStatus {
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::CreationPending),
            1 => Some(Self::InProgress),
            2 => Some(Self::Completed),
            3 => Some(Self::EvaluationPending),
            4 => Some(Self::Abandoned),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CreationPending => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::EvaluationPending => "Evaluation Pending",
            Self::Abandoned => "Abandoned",
        }
    }
}

/// One row of the results listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub assessment_id: AssessmentId,
    pub assessment_name: String,
    pub status: AssessmentStatus,
    pub last_attempted: Option<DateTime<Utc>>,
    pub total_obtained: Option<f64>,
    pub grand_total: Option<f64>,
    pub percentage: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentReport {
    pub status: AssessmentStatus,
    /// Absent until evaluation has produced a report.
    pub body: Option<ReportBody>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportBody {
    pub assessment_name: String,
    pub score: f64,
    pub feedback: String,
    pub categories: Vec<CategoryScore>,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub name: String,
    pub metrics: Vec<ReportMetric>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportMetric {
    pub name: String,
    pub total_score: f64,
    pub obtained_score: String,
}
