use assess_core::model::{AttemptedAnswers, OrderedSequence, QuestionRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorStatus {
    Current,
    Attempted,
    Unattempted,
}

/// One cell of the question navigator overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorEntry {
    pub display_index: usize,
    pub question: QuestionRef,
    pub status: NavigatorStatus,
}

/// Per-question status in sequence order. Read-only; selecting an entry
/// goes back through the session.
#[must_use]
pub fn project(
    sequence: &OrderedSequence,
    ledger: &AttemptedAnswers,
    position: Option<&QuestionRef>,
) -> Vec<NavigatorEntry> {
    sequence
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let status = if Some(question) == position {
                NavigatorStatus::Current
            } else if ledger.contains(question.question_id) {
                NavigatorStatus::Attempted
            } else {
                NavigatorStatus::Unattempted
            };
            NavigatorEntry {
                display_index: index + 1,
                question: question.clone(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{AnswerRecord, QuestionId, SectionListing};

    #[test]
    fn current_wins_over_attempted() {
        let sequence = OrderedSequence::build(&[
            SectionListing::new("A", vec![QuestionId::new(1), QuestionId::new(2)]),
            SectionListing::new("B", vec![QuestionId::new(3)]),
        ]);
        let mut ledger = AttemptedAnswers::new();
        ledger.record(QuestionId::new(1), AnswerRecord::SingleChoice { option_index: 0 });
        ledger.record(QuestionId::new(3), AnswerRecord::SingleChoice { option_index: 1 });

        let entries = project(&sequence, &ledger, sequence.get(0));
        let statuses: Vec<_> = entries.iter().map(|entry| entry.status).collect();
        assert_eq!(
            statuses,
            vec![
                NavigatorStatus::Current,
                NavigatorStatus::Unattempted,
                NavigatorStatus::Attempted
            ]
        );
        assert_eq!(entries[2].display_index, 3);
        assert_eq!(entries[2].question.section, "B");
    }

    #[test]
    fn no_position_marks_nothing_current() {
        let sequence =
            OrderedSequence::build(&[SectionListing::new("A", vec![QuestionId::new(1)])]);
        let entries = project(&sequence, &AttemptedAnswers::new(), None);
        assert_eq!(entries[0].status, NavigatorStatus::Unattempted);
    }
}
