mod answer;
mod deadline;
mod draft;
mod ids;
mod ledger;
mod question;
mod sequence;

pub use answer::{AnswerError, AnswerKind, AnswerRecord, FREE_TEXT_WORD_LIMIT, count_words};
pub use deadline::{
    DEFAULT_FALLBACK_DURATION_SECS, DeadlineMonitor, DeadlineSource, DeadlineState, DeadlineTick,
    ExpiryLatch, FallbackPolicy, format_remaining,
};
pub use draft::AnswerDraft;
pub use ids::{AssessmentId, ConfigId, ParseIdError, QuestionId};
pub use ledger::{AttemptedAnswerSnapshot, AttemptedAnswers};
pub use question::{Question, QuestionRef, SectionListing, SubQuestion, split_paragraphs};
pub use sequence::{Direction, OrderedSequence, SequenceError};
