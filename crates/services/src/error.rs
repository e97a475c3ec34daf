//! Shared error types for the services crate.

use thiserror::Error;

use assess_core::model::{AnswerError, QuestionId, SequenceError};

use crate::sessions::SessionPhase;

/// Failures talking to the assessment service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    #[error("assessment service unreachable: {0}")]
    Transport(String),
    /// Expected while a session expires or the user logs out; not escalated.
    #[error("not authorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("assessment has expired or was closed")]
    Expired,
    #[error("assessment service returned status {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            410 => Self::Expired,
            other => Self::Status(other),
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16());
        }
        Self::Transport(err.to_string())
    }
}

impl From<assess_core::Error> for ApiError {
    fn from(err: assess_core::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Errors emitted by the session coordinator and its workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Empty(#[from] SequenceError),
    #[error(transparent)]
    Validation(#[from] AnswerError),
    #[error("a submission is already in flight")]
    SubmissionPending,
    #[error("question content has not been loaded yet")]
    QuestionNotLoaded,
    #[error("operation not allowed while {phase:?}")]
    NotReady { phase: SessionPhase },
    #[error("question {0} is not part of this assessment")]
    UnknownQuestion(QuestionId),
    #[error("session already ended")]
    Ended,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    /// Notice text for the user, or `None` when the error should stay silent.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            SessionError::Api(ApiError::Unauthorized) => None,
            SessionError::Api(ApiError::Transport(_)) => {
                Some("Could not reach the assessment service. Please try again.".to_string())
            }
            SessionError::Api(ApiError::NotFound) => {
                Some("This question or session could not be found.".to_string())
            }
            SessionError::Api(ApiError::Expired) => {
                Some("This assessment is no longer accepting answers.".to_string())
            }
            other => Some(other.to_string()),
        }
    }
}
