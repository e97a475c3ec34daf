use thiserror::Error;

use crate::model::{AnswerError, SequenceError};
use crate::time::TimeError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Time(#[from] TimeError),
}
