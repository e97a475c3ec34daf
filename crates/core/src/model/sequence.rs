use thiserror::Error;

use crate::model::{QuestionId, QuestionRef, SectionListing};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("assessment contains no questions")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Section-major, then listing-order flattening of an assessment.
///
/// Built once per session load and never mutated afterwards; it is the only
/// source of truth for previous/next and for progress numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedSequence {
    refs: Vec<QuestionRef>,
}

impl OrderedSequence {
    #[must_use]
    pub fn build(sections: &[SectionListing]) -> Self {
        let refs = sections
            .iter()
            .flat_map(|listing| {
                listing
                    .question_ids
                    .iter()
                    .map(|id| QuestionRef::new(listing.section.clone(), *id))
            })
            .collect();
        Self { refs }
    }

    /// Like `build`, but refuses an empty listing.
    ///
    /// # Errors
    ///
    /// Returns `SequenceError::Empty` when no section lists any question.
    pub fn build_non_empty(sections: &[SectionListing]) -> Result<Self, SequenceError> {
        let sequence = Self::build(sections);
        if sequence.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(sequence)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&QuestionRef> {
        self.refs.get(index)
    }

    #[must_use]
    pub fn first(&self) -> Option<&QuestionRef> {
        self.refs.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionRef> {
        self.refs.iter()
    }

    #[must_use]
    pub fn index_of(&self, target: &QuestionRef) -> Option<usize> {
        self.refs.iter().position(|item| item == target)
    }

    /// First position holding `id`, whatever its section.
    #[must_use]
    pub fn index_of_id(&self, id: QuestionId) -> Option<usize> {
        self.refs.iter().position(|item| item.question_id == id)
    }

    /// 1-based number shown to the user.
    #[must_use]
    pub fn display_index(&self, target: &QuestionRef) -> Option<usize> {
        self.index_of(target).map(|index| index + 1)
    }

    #[must_use]
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.refs.len()
    }

    /// Saturating step: never wraps, never errors.
    #[must_use]
    pub fn step_index(&self, index: usize, direction: Direction) -> usize {
        match direction {
            Direction::Previous => index.saturating_sub(1),
            Direction::Next if index + 1 < self.refs.len() => index + 1,
            Direction::Next => index,
        }
    }

    /// Neighbor of `from` in `direction`, or `from` itself at either end
    /// (or when `from` is not part of the sequence).
    #[must_use]
    pub fn step<'a>(&'a self, from: &'a QuestionRef, direction: Direction) -> &'a QuestionRef {
        let Some(index) = self.index_of(from) else {
            return from;
        };
        let next = self.step_index(index, direction);
        self.refs.get(next).unwrap_or(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(id: u64) -> QuestionId {
        QuestionId::new(id)
    }

    fn sections() -> Vec<SectionListing> {
        vec![
            SectionListing::new("A", vec![qid(1), qid(2)]),
            SectionListing::new("B", vec![]),
            SectionListing::new("C", vec![qid(9), qid(3)]),
        ]
    }

    #[test]
    fn build_is_section_major_then_listing_order() {
        let sequence = OrderedSequence::build(&sections());
        let order: Vec<_> = sequence
            .iter()
            .map(|r| (r.section.as_str(), r.question_id.value()))
            .collect();
        assert_eq!(order, vec![("A", 1), ("A", 2), ("C", 9), ("C", 3)]);
        assert_eq!(sequence.len(), 4);
    }

    #[test]
    fn empty_listing_is_rejected_when_required() {
        let err = OrderedSequence::build_non_empty(&[SectionListing::new("A", vec![])]);
        assert_eq!(err, Err(SequenceError::Empty));
    }

    #[test]
    fn step_saturates_at_both_ends() {
        let sequence = OrderedSequence::build(&sections());
        let first = sequence.get(0).unwrap().clone();
        let last = sequence.get(3).unwrap().clone();

        assert_eq!(sequence.step(&first, Direction::Previous), &first);
        assert_eq!(sequence.step(&last, Direction::Next), &last);
        assert_eq!(
            sequence.step(&first, Direction::Next),
            &QuestionRef::new("A", qid(2))
        );
        assert_eq!(
            sequence.step(&last, Direction::Previous),
            &QuestionRef::new("C", qid(9))
        );
    }

    #[test]
    fn step_from_unknown_ref_is_unchanged() {
        let sequence = OrderedSequence::build(&sections());
        let stranger = QuestionRef::new("Z", qid(100));
        assert_eq!(sequence.step(&stranger, Direction::Next), &stranger);
    }

    #[test]
    fn identity_includes_section() {
        let sequence = OrderedSequence::build(&sections());
        assert_eq!(sequence.index_of(&QuestionRef::new("B", qid(1))), None);
        assert_eq!(sequence.display_index(&QuestionRef::new("C", qid(3))), Some(4));
        assert_eq!(sequence.index_of_id(qid(9)), Some(2));
        assert!(sequence.is_last(3));
        assert!(!sequence.is_last(2));
    }
}
