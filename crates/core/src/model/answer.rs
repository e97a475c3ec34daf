use std::collections::BTreeSet;

use thiserror::Error;

/// Soft cap on free-text answers. Exceeding it blocks user submission only.
pub const FREE_TEXT_WORD_LIMIT: usize = 250;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("answer has {count} words, the limit is {limit}")]
    WordLimitExceeded { count: usize, limit: usize },

    #[error("unknown answer type code: {0}")]
    UnknownKind(u8),
}

//
// ─── ANSWER KIND ──────────────────────────────────────────────────────────────
//

/// The four ways a question can be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerKind {
    SingleChoice,
    MultiChoice,
    FreeText,
    Spoken,
}

impl AnswerKind {
    /// Converts the service's `answer_type` code (0-3).
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::UnknownKind` for any other code.
    pub fn from_code(code: u8) -> Result<Self, AnswerError> {
        match code {
            0 => Ok(Self::SingleChoice),
            1 => Ok(Self::MultiChoice),
            2 => Ok(Self::FreeText),
            3 => Ok(Self::Spoken),
            _ => Err(AnswerError::UnknownKind(code)),
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            AnswerKind::SingleChoice => 0,
            AnswerKind::MultiChoice => 1,
            AnswerKind::FreeText => 2,
            AnswerKind::Spoken => 3,
        }
    }
}

//
// ─── ANSWER RECORD ────────────────────────────────────────────────────────────
//

/// A confirmed answer, carrying what is needed to resubmit it or to rebuild a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerRecord {
    SingleChoice { option_index: u32 },
    MultiChoice { option_indices: BTreeSet<u32> },
    FreeText { text: String },
    Spoken { audio_url: Option<String> },
}

impl AnswerRecord {
    #[must_use]
    pub fn kind(&self) -> AnswerKind {
        match self {
            AnswerRecord::SingleChoice { .. } => AnswerKind::SingleChoice,
            AnswerRecord::MultiChoice { .. } => AnswerKind::MultiChoice,
            AnswerRecord::FreeText { .. } => AnswerKind::FreeText,
            AnswerRecord::Spoken { .. } => AnswerKind::Spoken,
        }
    }

    /// Checks the free-text word cap. Other kinds always pass.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::WordLimitExceeded` when a free-text answer is over `limit`.
    pub fn check_word_limit(&self, limit: usize) -> Result<(), AnswerError> {
        if let AnswerRecord::FreeText { text } = self {
            let count = count_words(text);
            if count > limit {
                return Err(AnswerError::WordLimitExceeded { count, limit });
            }
        }
        Ok(())
    }
}

/// Whitespace-delimited word count.
#[must_use]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
