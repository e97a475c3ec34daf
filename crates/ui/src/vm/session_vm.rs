use assess_core::model::{AnswerDraft, AnswerKind, Direction, QuestionId, SubQuestion};
use services::{AssessmentSession, NavigatorStatus, SessionError, SessionPhase};

/// Edits the question panel can make to the current draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Select(u32),
    Toggle(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionVm {
    pub index: u32,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuestionVm {
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionVm {
    pub question_id: u64,
    pub kind: AnswerKind,
    pub prompt: Vec<String>,
    pub passage: Vec<String>,
    pub images: Vec<String>,
    pub hint: Option<String>,
    pub options: Vec<OptionVm>,
    pub sub_questions: Vec<SubQuestionVm>,
    pub text: String,
    pub word_count_label: String,
    pub over_limit: bool,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorCellVm {
    pub question_id: u64,
    pub label: String,
    pub class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHeaderVm {
    pub section: String,
    pub progress_label: String,
    pub attempted_label: String,
}

/// Display wrapper around the session coordinator.
#[derive(Debug)]
pub struct SessionVm {
    session: AssessmentSession,
}

impl SessionVm {
    #[must_use]
    pub fn new(session: AssessmentSession) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &AssessmentSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AssessmentSession {
        &mut self.session
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn current_question_id(&self) -> Option<QuestionId> {
        self.session.current().map(|question| question.question_id)
    }

    #[must_use]
    pub fn header(&self) -> SessionHeaderVm {
        let progress = self.session.progress();
        SessionHeaderVm {
            section: self
                .session
                .current()
                .map(|question| question.section.clone())
                .unwrap_or_default(),
            progress_label: progress.label(),
            attempted_label: format!("{} of {} answered", progress.attempted, progress.total),
        }
    }

    #[must_use]
    pub fn question(&self) -> Option<QuestionVm> {
        let question = self.session.question()?;
        let draft = self.session.draft()?;
        let limit = self.session.word_limit();
        let words = draft.word_count();

        let options = question
            .options
            .iter()
            .zip(0_u32..)
            .map(|(label, index)| OptionVm {
                index,
                label: label.clone(),
                selected: draft.is_selected(index),
            })
            .collect();

        let (text, audio_url) = match draft {
            AnswerDraft::FreeText { text } => (text.clone(), None),
            AnswerDraft::Spoken { audio_url } => (String::new(), audio_url.clone()),
            _ => (String::new(), None),
        };

        Some(QuestionVm {
            question_id: question.id.value(),
            kind: question.kind,
            prompt: owned(question.prompt_paragraphs()),
            passage: owned(question.passage_paragraphs()),
            images: question.image_urls.clone(),
            hint: question.hint.clone(),
            options,
            sub_questions: question.sub_questions.iter().map(map_sub_question).collect(),
            text,
            word_count_label: format!("{words} / {limit} words"),
            over_limit: words > limit,
            audio_url,
        })
    }

    #[must_use]
    pub fn navigator(&self) -> Vec<NavigatorCellVm> {
        self.session
            .navigator()
            .into_iter()
            .map(|entry| NavigatorCellVm {
                question_id: entry.question.question_id.value(),
                label: entry.display_index.to_string(),
                class: match entry.status {
                    NavigatorStatus::Current => "nav-cell current",
                    NavigatorStatus::Attempted => "nav-cell attempted",
                    NavigatorStatus::Unattempted => "nav-cell",
                },
            })
            .collect()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.session.phase() == SessionPhase::Ready && self.session.can_submit()
    }

    #[must_use]
    pub fn can_navigate(&self) -> bool {
        matches!(
            self.session.phase(),
            SessionPhase::Ready | SessionPhase::Submitting
        )
    }

    #[must_use]
    pub fn submit_label(&self) -> &'static str {
        if self.session.phase() == SessionPhase::Submitting {
            "Submitting…"
        } else if self.session.progress().is_last {
            "Submit & Finish"
        } else {
            "Submit & Next"
        }
    }

    /// Applies a draft edit; returns whether anything changed.
    pub fn apply(&mut self, edit: DraftEdit) -> bool {
        match edit {
            DraftEdit::Select(index) => self.session.select_option(index),
            DraftEdit::Toggle(index) => self.session.toggle_option(index),
            DraftEdit::Text(text) => self.session.set_text(text),
        }
    }

    /// # Errors
    ///
    /// Returns `SessionError` when navigation is not allowed right now.
    pub fn step(&mut self, direction: Direction) -> Result<(), SessionError> {
        self.session.step(direction).map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `SessionError` when the id is unknown or navigation is blocked.
    pub fn jump(&mut self, question_id: u64) -> Result<(), SessionError> {
        self.session
            .select(QuestionId::new(question_id))
            .map(|_| ())
    }
}

fn owned(lines: Vec<&str>) -> Vec<String> {
    lines.into_iter().map(str::to_string).collect()
}

fn map_sub_question(sub: &SubQuestion) -> SubQuestionVm {
    SubQuestionVm {
        prompt: sub.prompt.clone(),
        options: sub.options.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{AssessmentId, ExpiryLatch, Question, SectionListing};

    fn ready_vm() -> SessionVm {
        let mut session = AssessmentSession::new(AssessmentId::new(1), ExpiryLatch::new());
        session
            .hydrate(
                &[SectionListing::new(
                    "A",
                    vec![QuestionId::new(10), QuestionId::new(11)],
                )],
                &[],
                None,
            )
            .unwrap();
        session.attach_question(
            Question::new(QuestionId::new(10), AnswerKind::SingleChoice)
                .with_prompt("Pick one\n\nthen continue")
                .with_options(["red", "blue"]),
        );
        SessionVm::new(session)
    }

    #[test]
    fn question_vm_reflects_draft_selection() {
        let mut vm = ready_vm();

        assert!(vm.apply(DraftEdit::Select(1)));

        let question = vm.question().unwrap();
        assert_eq!(question.prompt, vec!["Pick one", "then continue"]);
        assert!(!question.options[0].selected);
        assert!(question.options[1].selected);
        assert!(vm.can_submit());
        assert_eq!(vm.submit_label(), "Submit & Next");
    }

    #[test]
    fn navigator_marks_current_cell() {
        let vm = ready_vm();
        let cells = vm.navigator();

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].class, "nav-cell current");
        assert_eq!(cells[1].class, "nav-cell");
        assert_eq!(vm.header().progress_label, "1 / 2");
    }

    #[test]
    fn jump_moves_position_and_clears_question() {
        let mut vm = ready_vm();

        vm.jump(11).unwrap();

        assert_eq!(vm.current_question_id(), Some(QuestionId::new(11)));
        assert!(vm.question().is_none());
        assert!(!vm.can_submit());
        assert_eq!(vm.submit_label(), "Submit & Finish");
        assert!(vm.jump(99).is_err());
    }
}
