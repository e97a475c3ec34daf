use dioxus::prelude::*;
use services::{ApiError, SessionError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    Unreachable,
    NotFound,
    Closed,
    Empty,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Unknown => "Something went wrong. Please try again.",
            Self::Unreachable => "Could not reach the assessment service. Please try again.",
            Self::NotFound => "This assessment could not be found.",
            Self::Closed => "This assessment is no longer accepting answers.",
            Self::Empty => "This assessment has no questions.",
        }
    }
}

impl From<&ApiError> for ViewError {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Transport(_) => Self::Unreachable,
            ApiError::NotFound => Self::NotFound,
            ApiError::Expired => Self::Closed,
            _ => Self::Unknown,
        }
    }
}

impl From<&SessionError> for ViewError {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Api(api) => api.into(),
            SessionError::Empty(_) => Self::Empty,
            SessionError::Ended => Self::Closed,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
