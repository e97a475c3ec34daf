use assess_core::model::{
    AnswerDraft, AnswerRecord, AssessmentId, AttemptedAnswerSnapshot, AttemptedAnswers, Direction,
    ExpiryLatch, FREE_TEXT_WORD_LIMIT, OrderedSequence, Question, QuestionId, QuestionRef,
    SectionListing, SequenceError,
};

use super::navigator::{self, NavigatorEntry};
use super::progress::SessionProgress;
use crate::error::{ApiError, SessionError};

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The user confirmed ending the assessment.
    Confirmed,
    /// Time ran out; no confirmation is asked for.
    Expired,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
    Submitting,
    EndConfirming,
    Ending(EndReason),
    Ended,
}

impl SessionPhase {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, SessionPhase::Ending(_) | SessionPhase::Ended)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    User,
    Expiry,
}

/// A submission taken out of the session so the remote call can run without
/// holding on to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    question: QuestionRef,
    answer: Option<AnswerRecord>,
    trigger: SubmitTrigger,
}

impl SubmitTicket {
    #[must_use]
    pub fn question(&self) -> &QuestionRef {
        &self.question
    }

    /// `None` when the draft was empty; nothing is sent in that case.
    #[must_use]
    pub fn answer(&self) -> Option<&AnswerRecord> {
        self.answer.as_ref()
    }

    #[must_use]
    pub fn trigger(&self) -> SubmitTrigger {
        self.trigger
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Moved on to the next question.
    Advanced(QuestionRef),
    /// Stored, but the user had already navigated elsewhere.
    Recorded,
    /// The last question was answered; waiting for the user to confirm the end.
    ConfirmEnd,
    /// Time ran out while a draft was still unsent; send this ticket, then end.
    ForceSubmit(SubmitTicket),
    /// The session must now be closed remotely.
    Ending,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryAction {
    /// Send this ticket, then end.
    ForceSubmit(SubmitTicket),
    /// A submission is in flight; ending happens once it settles.
    AwaitInFlight,
    /// Nothing to submit; close the session.
    Close,
    Ignore,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Single owner of the sequence, ledger, position and draft for one attempt.
///
/// Everything here is synchronous. Remote calls happen between
/// `begin_submit`/`finish_submit` and `confirm_end`/`complete_end`, driven by
/// `SessionLoopService` or the UI.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    assessment_id: AssessmentId,
    sequence: OrderedSequence,
    ledger: AttemptedAnswers,
    position: usize,
    question: Option<Question>,
    draft: Option<AnswerDraft>,
    phase: SessionPhase,
    in_flight: Option<QuestionRef>,
    latch: ExpiryLatch,
    word_limit: usize,
}

impl AssessmentSession {
    #[must_use]
    pub fn new(assessment_id: AssessmentId, latch: ExpiryLatch) -> Self {
        Self {
            assessment_id,
            sequence: OrderedSequence::default(),
            ledger: AttemptedAnswers::new(),
            position: 0,
            question: None,
            draft: None,
            phase: SessionPhase::Loading,
            in_flight: None,
            latch,
            word_limit: FREE_TEXT_WORD_LIMIT,
        }
    }

    #[must_use]
    pub fn with_word_limit(mut self, word_limit: usize) -> Self {
        self.word_limit = word_limit;
        self
    }

    /// Builds the sequence and ledger from the server's state and resolves
    /// the position: `target` if it is listed, else the first question.
    ///
    /// Called again on an already-ready session this is a resync: the
    /// current position is kept when it is still listed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when no question is listed and
    /// `SessionError::NotReady` while a submission or the end sequence runs.
    pub fn hydrate(
        &mut self,
        sections: &[SectionListing],
        attempted: &[AttemptedAnswerSnapshot],
        target: Option<QuestionId>,
    ) -> Result<&QuestionRef, SessionError> {
        if !matches!(self.phase, SessionPhase::Loading | SessionPhase::Ready) {
            return Err(SessionError::NotReady { phase: self.phase });
        }
        let sequence = OrderedSequence::build_non_empty(sections)?;

        let kept = self
            .current()
            .and_then(|current| sequence.index_of(current));
        let position = kept
            .or_else(|| target.and_then(|id| sequence.index_of_id(id)))
            .unwrap_or(0);

        if kept.is_none() {
            self.question = None;
            self.draft = None;
        }
        self.sequence = sequence;
        self.ledger = AttemptedAnswers::hydrate(attempted);
        self.position = position;
        self.phase = SessionPhase::Ready;
        self.current()
            .ok_or(SessionError::Empty(SequenceError::Empty))
    }

    #[must_use]
    pub fn assessment_id(&self) -> AssessmentId {
        self.assessment_id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn sequence(&self) -> &OrderedSequence {
        &self.sequence
    }

    #[must_use]
    pub fn ledger(&self) -> &AttemptedAnswers {
        &self.ledger
    }

    #[must_use]
    pub fn latch(&self) -> &ExpiryLatch {
        &self.latch
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.latch.is_fired()
    }

    /// The question on screen. `None` only while loading or after the end.
    #[must_use]
    pub fn current(&self) -> Option<&QuestionRef> {
        if self.phase == SessionPhase::Loading {
            return None;
        }
        self.sequence.get(self.position)
    }

    /// Loaded content of the current question, if it has arrived.
    #[must_use]
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    #[must_use]
    pub fn draft(&self) -> Option<&AnswerDraft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<&QuestionRef> {
        self.in_flight.as_ref()
    }

    #[must_use]
    pub fn word_limit(&self) -> usize {
        self.word_limit
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let ready = self.current().is_some();
        SessionProgress {
            total: self.sequence.len(),
            attempted: self
                .sequence
                .iter()
                .filter(|question| self.ledger.contains(question.question_id))
                .count(),
            display_index: if ready { self.position + 1 } else { 0 },
            is_last: ready && self.sequence.is_last(self.position),
        }
    }

    #[must_use]
    pub fn navigator(&self) -> Vec<NavigatorEntry> {
        navigator::project(&self.sequence, &self.ledger, self.current())
    }

    /// Installs fetched question content and hydrates the draft from the ledger.
    ///
    /// Returns `false` for content that no longer matches the position.
    pub fn attach_question(&mut self, question: Question) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        if current.question_id != question.id || self.phase.is_finished() {
            return false;
        }

        let keep_draft = self
            .draft
            .as_ref()
            .is_some_and(|draft| draft.kind() == question.kind);
        if !keep_draft {
            self.draft = Some(AnswerDraft::hydrate(
                question.kind,
                self.ledger.lookup(question.id),
            ));
        }
        self.question = Some(question);
        true
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    fn ensure_navigable(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Submitting => Ok(()),
            SessionPhase::Ending(_) | SessionPhase::Ended => Err(SessionError::Ended),
            phase => Err(SessionError::NotReady { phase }),
        }
    }

    fn move_to(&mut self, index: usize) {
        if index != self.position {
            self.position = index;
            self.question = None;
            self.draft = None;
        }
    }

    /// Jumps to `question_id`, e.g. from the navigator overlay.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownQuestion` for an id outside the sequence.
    pub fn select(&mut self, question_id: QuestionId) -> Result<&QuestionRef, SessionError> {
        self.ensure_navigable()?;
        let index = self
            .sequence
            .index_of_id(question_id)
            .ok_or(SessionError::UnknownQuestion(question_id))?;
        self.move_to(index);
        self.current().ok_or(SessionError::UnknownQuestion(question_id))
    }

    /// Previous/next, saturating at both ends.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReady` while confirming or `Ended` after the end.
    pub fn step(&mut self, direction: Direction) -> Result<&QuestionRef, SessionError> {
        self.ensure_navigable()?;
        let index = self.sequence.step_index(self.position, direction);
        self.move_to(index);
        self.current().ok_or(SessionError::Ended)
    }

    //
    // ─── DRAFT EDITS ───────────────────────────────────────────────────────────
    //

    fn draft_mut(&mut self) -> Option<&mut AnswerDraft> {
        match self.phase {
            SessionPhase::Ready | SessionPhase::Submitting => self.draft.as_mut(),
            _ => None,
        }
    }

    pub fn select_option(&mut self, index: u32) -> bool {
        self.draft_mut()
            .is_some_and(|draft| draft.select_option(index))
    }

    pub fn toggle_option(&mut self, index: u32) -> bool {
        self.draft_mut()
            .is_some_and(|draft| draft.toggle_option(index))
    }

    /// Editing is never blocked by the word cap; only submission is.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        self.draft_mut().is_some_and(|draft| draft.set_text(text))
    }

    pub fn set_audio_url(&mut self, url: Option<String>) -> bool {
        self.draft_mut()
            .is_some_and(|draft| draft.set_audio_url(url))
    }

    /// Whether a user submission would pass the guards right now.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase == SessionPhase::Ready
            && self
                .draft
                .as_ref()
                .is_some_and(|draft| draft.check_word_limit(self.word_limit).is_ok())
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// Takes the current draft out as a ticket and enters `Submitting`.
    ///
    /// User submissions need loaded content and respect the word cap;
    /// expiry submissions send whatever there is.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionPending` while another submission is in flight,
    /// `Validation` for an over-long free-text answer, `QuestionNotLoaded`
    /// before the content has arrived.
    pub fn begin_submit(&mut self, trigger: SubmitTrigger) -> Result<SubmitTicket, SessionError> {
        match self.phase {
            SessionPhase::Ready => {}
            SessionPhase::Submitting => return Err(SessionError::SubmissionPending),
            SessionPhase::Ending(_) | SessionPhase::Ended => return Err(SessionError::Ended),
            phase => return Err(SessionError::NotReady { phase }),
        }
        let question = self
            .current()
            .cloned()
            .ok_or(SessionError::NotReady { phase: self.phase })?;

        if trigger == SubmitTrigger::User {
            let draft = self.draft.as_ref().ok_or(SessionError::QuestionNotLoaded)?;
            draft.check_word_limit(self.word_limit)?;
        }

        let answer = self.draft.as_ref().and_then(AnswerDraft::to_answer);
        self.phase = SessionPhase::Submitting;
        self.in_flight = Some(question.clone());
        Ok(SubmitTicket {
            question,
            answer,
            trigger,
        })
    }

    /// Applies the settled remote call for `ticket`.
    ///
    /// An expiry that fired meanwhile takes precedence over everything else.
    /// If the draft on screen was not delivered by this call (the call failed,
    /// or the user moved on and answered another question) it comes back as
    /// `ForceSubmit`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` when the remote call failed; the draft and
    /// position are untouched so the user can retry.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<(), ApiError>,
    ) -> Result<SubmitOutcome, SessionError> {
        if self.phase == SessionPhase::Ended {
            return Ok(SubmitOutcome::Ended);
        }
        if self.in_flight.as_ref() == Some(&ticket.question) {
            self.in_flight = None;
        }

        let failed = result.is_err();
        if let Some(answer) = ticket.answer.filter(|_| !failed) {
            self.ledger.record(ticket.question.question_id, answer);
        }

        if self.latch.is_fired() || ticket.trigger == SubmitTrigger::Expiry {
            self.latch.fire();
            if ticket.trigger == SubmitTrigger::User {
                let moved = self.sequence.index_of(&ticket.question) != Some(self.position);
                if let Some(forced) = self.take_unsent_draft(failed || moved) {
                    return Ok(SubmitOutcome::ForceSubmit(forced));
                }
            }
            self.phase = SessionPhase::Ending(EndReason::Expired);
            return Ok(SubmitOutcome::Ending);
        }

        if let Err(err) = result {
            self.phase = SessionPhase::Ready;
            return Err(SessionError::Api(err));
        }

        let still_here = self
            .sequence
            .index_of(&ticket.question)
            .filter(|index| *index == self.position);
        match still_here {
            Some(index) if self.sequence.is_last(index) => {
                self.draft = None;
                self.question = None;
                self.phase = SessionPhase::EndConfirming;
                Ok(SubmitOutcome::ConfirmEnd)
            }
            Some(index) => {
                let next = self.sequence.step_index(index, Direction::Next);
                self.move_to(next);
                self.phase = SessionPhase::Ready;
                let current = self.current().cloned().ok_or(SessionError::Ended)?;
                Ok(SubmitOutcome::Advanced(current))
            }
            None => {
                self.phase = SessionPhase::Ready;
                Ok(SubmitOutcome::Recorded)
            }
        }
    }

    /// After expiry, turns a draft the settled user ticket did not deliver
    /// into the forced submission.
    fn take_unsent_draft(&mut self, unsent: bool) -> Option<SubmitTicket> {
        let has_answer = self
            .draft
            .as_ref()
            .and_then(AnswerDraft::to_answer)
            .is_some();
        if !unsent || !has_answer {
            return None;
        }
        self.phase = SessionPhase::Ready;
        self.begin_submit(SubmitTrigger::Expiry).ok()
    }

    /// Reacts to the deadline's expiry signal.
    pub fn on_expiry(&mut self) -> ExpiryAction {
        self.latch.fire();
        match self.phase {
            SessionPhase::Ready => match self.begin_submit(SubmitTrigger::Expiry) {
                Ok(ticket) => ExpiryAction::ForceSubmit(ticket),
                Err(_) => {
                    self.phase = SessionPhase::Ending(EndReason::Expired);
                    ExpiryAction::Close
                }
            },
            SessionPhase::Submitting => ExpiryAction::AwaitInFlight,
            SessionPhase::Loading | SessionPhase::EndConfirming => {
                self.phase = SessionPhase::Ending(EndReason::Expired);
                ExpiryAction::Close
            }
            SessionPhase::Ending(EndReason::Confirmed) => {
                self.phase = SessionPhase::Ending(EndReason::Expired);
                ExpiryAction::Ignore
            }
            SessionPhase::Ending(EndReason::Expired) | SessionPhase::Ended => ExpiryAction::Ignore,
        }
    }

    //
    // ─── ENDING ────────────────────────────────────────────────────────────────
    //

    /// Asks to finish early. Enters the same confirmation as the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReady` unless the session is `Ready`.
    pub fn request_end(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Ready => {
                self.phase = SessionPhase::EndConfirming;
                Ok(())
            }
            SessionPhase::EndConfirming => Ok(()),
            phase => Err(SessionError::NotReady { phase }),
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotReady` outside `EndConfirming`.
    pub fn confirm_end(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::EndConfirming => {
                self.phase = SessionPhase::Ending(EndReason::Confirmed);
                Ok(())
            }
            phase => Err(SessionError::NotReady { phase }),
        }
    }

    /// Back to `Ready` at the same position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReady` outside `EndConfirming`.
    pub fn decline_end(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::EndConfirming => {
                self.phase = SessionPhase::Ready;
                Ok(())
            }
            phase => Err(SessionError::NotReady { phase }),
        }
    }

    /// Applies the result of closing the remote session.
    ///
    /// A failed close after confirmation goes back to `EndConfirming`; after
    /// expiry the session ends locally regardless.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` when a confirmed close failed, and
    /// `SessionError::NotReady` outside `Ending`.
    pub fn complete_end(&mut self, result: Result<(), ApiError>) -> Result<(), SessionError> {
        let SessionPhase::Ending(reason) = self.phase else {
            return match self.phase {
                SessionPhase::Ended => Ok(()),
                phase => Err(SessionError::NotReady { phase }),
            };
        };

        match (result, reason) {
            (Err(err), EndReason::Confirmed) => {
                self.phase = SessionPhase::EndConfirming;
                Err(SessionError::Api(err))
            }
            _ => {
                self.phase = SessionPhase::Ended;
                self.ledger.clear();
                self.draft = None;
                self.question = None;
                self.in_flight = None;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::AnswerKind;

    fn id(value: u64) -> QuestionId {
        QuestionId::new(value)
    }

    fn sections() -> Vec<SectionListing> {
        vec![
            SectionListing::new("A", vec![id(1), id(2)]),
            SectionListing::new("B", vec![id(3)]),
        ]
    }

    fn ready(target: Option<QuestionId>) -> AssessmentSession {
        let mut session = AssessmentSession::new(AssessmentId::new(10), ExpiryLatch::new());
        session
            .hydrate(&sections(), &[], target)
            .expect("hydrate");
        session
    }

    fn loaded(session: &mut AssessmentSession, kind: AnswerKind) {
        let current = session.current().expect("position").question_id;
        assert!(session.attach_question(Question::new(current, kind)));
    }

    #[test]
    fn hydrate_resolves_listed_target_or_first() {
        let session = ready(Some(id(3)));
        assert_eq!(session.current().map(|q| q.question_id), Some(id(3)));

        let session = ready(Some(id(99)));
        assert_eq!(session.current().map(|q| q.question_id), Some(id(1)));
    }

    #[test]
    fn hydrate_rejects_empty_listing() {
        let mut session = AssessmentSession::new(AssessmentId::new(1), ExpiryLatch::new());
        let result = session.hydrate(&[SectionListing::new("A", vec![])], &[], None);
        assert!(matches!(result, Err(SessionError::Empty(_))));
        assert_eq!(session.phase(), SessionPhase::Loading);
    }

    #[test]
    fn resync_keeps_position_and_rebuilds_ledger() {
        let mut session = ready(Some(id(2)));
        let mut row = AttemptedAnswerSnapshot::new(id(1));
        row.single_choice = Some(0);

        session
            .hydrate(&sections(), &[row], Some(id(3)))
            .expect("resync");

        assert_eq!(session.current().map(|q| q.question_id), Some(id(2)));
        assert!(session.ledger().contains(id(1)));
    }

    #[test]
    fn attach_discards_stale_content() {
        let mut session = ready(None);
        assert!(!session.attach_question(Question::new(id(2), AnswerKind::FreeText)));
        assert!(session.draft().is_none());
    }

    #[test]
    fn attach_hydrates_draft_from_ledger() {
        let mut row = AttemptedAnswerSnapshot::new(id(1));
        row.single_choice = Some(2);
        let mut session = AssessmentSession::new(AssessmentId::new(10), ExpiryLatch::new());
        session.hydrate(&sections(), &[row], None).expect("hydrate");

        loaded(&mut session, AnswerKind::SingleChoice);
        assert_eq!(
            session.draft(),
            Some(&AnswerDraft::SingleChoice { selected: Some(2) })
        );
    }

    #[test]
    fn second_submit_is_refused_while_pending() {
        let mut session = ready(None);
        loaded(&mut session, AnswerKind::SingleChoice);
        session.select_option(1);

        let _ticket = session.begin_submit(SubmitTrigger::User).expect("ticket");
        assert!(matches!(
            session.begin_submit(SubmitTrigger::User),
            Err(SessionError::SubmissionPending)
        ));
    }

    #[test]
    fn user_submit_before_content_is_refused() {
        let mut session = ready(None);
        assert!(matches!(
            session.begin_submit(SubmitTrigger::User),
            Err(SessionError::QuestionNotLoaded)
        ));
    }

    #[test]
    fn failure_keeps_draft_and_position() {
        let mut session = ready(None);
        loaded(&mut session, AnswerKind::FreeText);
        session.set_text("draft text");

        let ticket = session.begin_submit(SubmitTrigger::User).expect("ticket");
        let result = session.finish_submit(ticket, Err(ApiError::Transport("down".into())));

        assert!(matches!(result, Err(SessionError::Api(ApiError::Transport(_)))));
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.current().map(|q| q.question_id), Some(id(1)));
        assert_eq!(
            session.draft(),
            Some(&AnswerDraft::FreeText {
                text: "draft text".into()
            })
        );
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn empty_draft_advances_without_recording() {
        let mut session = ready(None);
        loaded(&mut session, AnswerKind::MultiChoice);

        let ticket = session.begin_submit(SubmitTrigger::User).expect("ticket");
        assert!(ticket.answer().is_none());
        let outcome = session.finish_submit(ticket, Ok(())).expect("finish");

        assert_eq!(
            outcome,
            SubmitOutcome::Advanced(QuestionRef::new("A", id(2)))
        );
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn navigating_during_submission_records_without_moving() {
        let mut session = ready(None);
        loaded(&mut session, AnswerKind::SingleChoice);
        session.select_option(0);
        let ticket = session.begin_submit(SubmitTrigger::User).expect("ticket");

        session.select(id(3)).expect("navigate");
        let outcome = session.finish_submit(ticket, Ok(())).expect("finish");

        assert_eq!(outcome, SubmitOutcome::Recorded);
        assert_eq!(session.current().map(|q| q.question_id), Some(id(3)));
        assert!(session.ledger().contains(id(1)));
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn decline_returns_to_last_question() {
        let mut session = ready(Some(id(3)));
        loaded(&mut session, AnswerKind::SingleChoice);
        session.select_option(1);
        let ticket = session.begin_submit(SubmitTrigger::User).expect("ticket");
        assert_eq!(
            session.finish_submit(ticket, Ok(())).expect("finish"),
            SubmitOutcome::ConfirmEnd
        );

        session.decline_end().expect("decline");
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.current().map(|q| q.question_id), Some(id(3)));
    }

    #[test]
    fn early_exit_goes_through_confirmation() {
        let mut session = ready(None);
        session.request_end().expect("request");
        assert_eq!(session.phase(), SessionPhase::EndConfirming);
        assert!(matches!(
            session.step(Direction::Next),
            Err(SessionError::NotReady { .. })
        ));
        session.confirm_end().expect("confirm");
        assert_eq!(session.phase(), SessionPhase::Ending(EndReason::Confirmed));
    }

    #[test]
    fn failed_confirmed_close_can_be_retried() {
        let mut session = ready(None);
        session.request_end().expect("request");
        session.confirm_end().expect("confirm");

        let result = session.complete_end(Err(ApiError::Status(500)));
        assert!(result.is_err());
        assert_eq!(session.phase(), SessionPhase::EndConfirming);
    }

    #[test]
    fn close_waits_for_the_forced_ticket() {
        let mut session = ready(None);
        assert_eq!(session.on_expiry(), ExpiryAction::ForceSubmit(SubmitTicket {
            question: QuestionRef::new("A", id(1)),
            answer: None,
            trigger: SubmitTrigger::Expiry,
        }));
        assert!(matches!(
            session.complete_end(Err(ApiError::Unauthorized)),
            Err(SessionError::NotReady { phase: SessionPhase::Submitting })
        ));
    }

    #[test]
    fn expired_close_ends_locally_even_on_failure() {
        let mut session = ready(None);
        let ExpiryAction::ForceSubmit(ticket) = session.on_expiry() else {
            panic!("expected a forced submission");
        };
        assert_eq!(
            session.finish_submit(ticket, Ok(())).expect("settle"),
            SubmitOutcome::Ending
        );
        session
            .complete_end(Err(ApiError::Unauthorized))
            .expect("ends anyway");
        assert_eq!(session.phase(), SessionPhase::Ended);

        let mut session = ready(None);
        session.request_end().expect("request");
        assert_eq!(session.on_expiry(), ExpiryAction::Close);
        session
            .complete_end(Err(ApiError::Unauthorized))
            .expect("ends anyway");
        assert_eq!(session.phase(), SessionPhase::Ended);
    }

    #[test]
    fn decline_outside_confirmation_is_refused() {
        let mut session = ready(None);
        let err = session.decline_end().expect_err("not confirming");
        assert!(matches!(err, SessionError::NotReady { phase: SessionPhase::Ready }));
        assert!(err.notice().is_some());
    }

    #[test]
    fn failed_submission_after_expiry_is_resent() {
        let mut session = ready(Some(id(2)));
        loaded(&mut session, AnswerKind::FreeText);
        assert!(session.set_text("final answer"));

        let ticket = session.begin_submit(SubmitTrigger::User).expect("begin");
        assert_eq!(session.on_expiry(), ExpiryAction::AwaitInFlight);

        let outcome = session
            .finish_submit(ticket, Err(ApiError::Transport("offline".into())))
            .expect("settle");
        let SubmitOutcome::ForceSubmit(forced) = outcome else {
            panic!("expected the draft to be resent, got {outcome:?}");
        };
        assert_eq!(forced.question(), &QuestionRef::new("A", id(2)));
        assert_eq!(forced.trigger(), SubmitTrigger::Expiry);
        assert_eq!(
            forced.answer(),
            Some(&AnswerRecord::FreeText { text: "final answer".into() })
        );
        assert_eq!(session.phase(), SessionPhase::Submitting);

        assert_eq!(
            session.finish_submit(forced, Ok(())).expect("forced"),
            SubmitOutcome::Ending
        );
        assert!(session.ledger().contains(id(2)));
    }

    #[test]
    fn delivered_submission_after_expiry_just_ends() {
        let mut session = ready(Some(id(2)));
        loaded(&mut session, AnswerKind::FreeText);
        assert!(session.set_text("done"));

        let ticket = session.begin_submit(SubmitTrigger::User).expect("begin");
        session.on_expiry();
        assert_eq!(
            session.finish_submit(ticket, Ok(())).expect("settle"),
            SubmitOutcome::Ending
        );
        assert_eq!(session.phase(), SessionPhase::Ending(EndReason::Expired));
    }

    #[test]
    fn expiry_is_ignored_after_end() {
        let mut session = ready(None);
        session.request_end().expect("request");
        session.confirm_end().expect("confirm");
        session.complete_end(Ok(())).expect("close");

        assert_eq!(session.on_expiry(), ExpiryAction::Ignore);
        assert_eq!(session.phase(), SessionPhase::Ended);
        assert!(session.ledger().is_empty());
    }
}
