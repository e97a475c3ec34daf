use std::collections::{BTreeSet, HashMap};

use crate::model::{AnswerRecord, QuestionId};

/// One attempted-question row from the server's session state.
///
/// A row may carry several fields at their empty/default values; only one
/// of them is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptedAnswerSnapshot {
    pub question_id: QuestionId,
    pub free_text: Option<String>,
    pub multi_choice: Vec<i64>,
    pub audio_url: Option<String>,
    pub single_choice: Option<i64>,
}

impl AttemptedAnswerSnapshot {
    #[must_use]
    pub fn new(question_id: QuestionId) -> Self {
        Self {
            question_id,
            ..Self::default()
        }
    }

    /// Picks the populated field in priority order:
    /// free text, multi-choice, spoken audio url, single choice.
    ///
    /// Negative option indices are placeholders for "no selection" and are ignored.
    #[must_use]
    pub fn resolve(&self) -> Option<AnswerRecord> {
        if let Some(text) = self.free_text.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(AnswerRecord::FreeText {
                text: text.to_string(),
            });
        }

        let option_indices: BTreeSet<u32> = self
            .multi_choice
            .iter()
            .filter_map(|value| u32::try_from(*value).ok())
            .collect();
        if !option_indices.is_empty() {
            return Some(AnswerRecord::MultiChoice { option_indices });
        }

        if let Some(url) = self.audio_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(AnswerRecord::Spoken {
                audio_url: Some(url.to_string()),
            });
        }

        self.single_choice
            .and_then(|value| u32::try_from(value).ok())
            .map(|option_index| AnswerRecord::SingleChoice { option_index })
    }
}

/// Last known answer per question for the current session.
///
/// Seeded once from the server snapshot, then overwritten locally on every
/// acknowledged submission (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptedAnswers {
    entries: HashMap<QuestionId, AnswerRecord>,
}

impl AttemptedAnswers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows with nothing populated are skipped.
    #[must_use]
    pub fn hydrate(snapshot: &[AttemptedAnswerSnapshot]) -> Self {
        let entries = snapshot
            .iter()
            .filter_map(|row| row.resolve().map(|answer| (row.question_id, answer)))
            .collect();
        Self { entries }
    }

    /// Unconditional overwrite. Returns the value it replaced.
    pub fn record(&mut self, id: QuestionId, answer: AnswerRecord) -> Option<AnswerRecord> {
        self.entries.insert(id, answer)
    }

    #[must_use]
    pub fn lookup(&self, id: QuestionId) -> Option<&AnswerRecord> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.entries.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
