use std::collections::BTreeSet;

use crate::model::{AnswerError, AnswerKind, AnswerRecord, count_words};

/// In-progress answer for the question currently on screen.
///
/// The variant is fixed by the question's kind; edits aimed at another kind
/// are ignored and reported as `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerDraft {
    SingleChoice { selected: Option<u32> },
    MultiChoice { selected: BTreeSet<u32> },
    FreeText { text: String },
    Spoken { audio_url: Option<String> },
}

impl AnswerDraft {
    #[must_use]
    pub fn empty(kind: AnswerKind) -> Self {
        match kind {
            AnswerKind::SingleChoice => Self::SingleChoice { selected: None },
            AnswerKind::MultiChoice => Self::MultiChoice {
                selected: BTreeSet::new(),
            },
            AnswerKind::FreeText => Self::FreeText {
                text: String::new(),
            },
            AnswerKind::Spoken => Self::Spoken { audio_url: None },
        }
    }

    /// Starts a draft for `kind`, prefilled from a previous answer of the same kind.
    #[must_use]
    pub fn hydrate(kind: AnswerKind, previous: Option<&AnswerRecord>) -> Self {
        match (kind, previous) {
            (AnswerKind::SingleChoice, Some(AnswerRecord::SingleChoice { option_index })) => {
                Self::SingleChoice {
                    selected: Some(*option_index),
                }
            }
            (AnswerKind::MultiChoice, Some(AnswerRecord::MultiChoice { option_indices })) => {
                Self::MultiChoice {
                    selected: option_indices.clone(),
                }
            }
            (AnswerKind::FreeText, Some(AnswerRecord::FreeText { text })) => {
                Self::FreeText { text: text.clone() }
            }
            (AnswerKind::Spoken, Some(AnswerRecord::Spoken { audio_url })) => Self::Spoken {
                audio_url: audio_url.clone(),
            },
            (kind, _) => Self::empty(kind),
        }
    }

    #[must_use]
    pub fn kind(&self) -> AnswerKind {
        match self {
            Self::SingleChoice { .. } => AnswerKind::SingleChoice,
            Self::MultiChoice { .. } => AnswerKind::MultiChoice,
            Self::FreeText { .. } => AnswerKind::FreeText,
            Self::Spoken { .. } => AnswerKind::Spoken,
        }
    }

    pub fn select_option(&mut self, index: u32) -> bool {
        match self {
            Self::SingleChoice { selected } => {
                *selected = Some(index);
                true
            }
            _ => false,
        }
    }

    pub fn toggle_option(&mut self, index: u32) -> bool {
        match self {
            Self::MultiChoice { selected } => {
                if !selected.remove(&index) {
                    selected.insert(index);
                }
                true
            }
            _ => false,
        }
    }

    /// Editing is never blocked by the word cap.
    pub fn set_text(&mut self, value: impl Into<String>) -> bool {
        match self {
            Self::FreeText { text } => {
                *text = value.into();
                true
            }
            _ => false,
        }
    }

    pub fn set_audio_url(&mut self, url: Option<String>) -> bool {
        match self {
            Self::Spoken { audio_url } => {
                *audio_url = url;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        match self {
            Self::FreeText { text } => count_words(text),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_selected(&self, index: u32) -> bool {
        match self {
            Self::SingleChoice { selected } => *selected == Some(index),
            Self::MultiChoice { selected } => selected.contains(&index),
            _ => false,
        }
    }

    /// # Errors
    ///
    /// Returns `AnswerError::WordLimitExceeded` for free text over `limit` words.
    pub fn check_word_limit(&self, limit: usize) -> Result<(), AnswerError> {
        let count = self.word_count();
        if count > limit {
            return Err(AnswerError::WordLimitExceeded { count, limit });
        }
        Ok(())
    }

    /// The answer to send, or `None` when nothing has been chosen or entered.
    #[must_use]
    pub fn to_answer(&self) -> Option<AnswerRecord> {
        match self {
            Self::SingleChoice { selected } => selected
                .map(|option_index| AnswerRecord::SingleChoice { option_index }),
            Self::MultiChoice { selected } if selected.is_empty() => None,
            Self::MultiChoice { selected } => Some(AnswerRecord::MultiChoice {
                option_indices: selected.clone(),
            }),
            Self::FreeText { text } if text.trim().is_empty() => None,
            Self::FreeText { text } => Some(AnswerRecord::FreeText { text: text.clone() }),
            Self::Spoken { audio_url: None } => None,
            Self::Spoken { audio_url } => Some(AnswerRecord::Spoken {
                audio_url: audio_url.clone(),
            }),
        }
    }
}
