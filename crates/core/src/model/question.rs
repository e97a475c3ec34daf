use std::fmt;

use crate::model::{AnswerKind, QuestionId};

/// Identity of a question within the navigation order: its section plus its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestionRef {
    pub section: String,
    pub question_id: QuestionId,
}

impl QuestionRef {
    #[must_use]
    pub fn new(section: impl Into<String>, question_id: QuestionId) -> Self {
        Self {
            section: section.into(),
            question_id,
        }
    }
}

impl fmt::Display for QuestionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.section, self.question_id)
    }
}

/// One section of the server's listing, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionListing {
    pub section: String,
    pub question_ids: Vec<QuestionId>,
}

impl SectionListing {
    #[must_use]
    pub fn new(section: impl Into<String>, question_ids: Vec<QuestionId>) -> Self {
        Self {
            section: section.into(),
            question_ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuestion {
    pub prompt: String,
    pub options: Vec<String>,
}

/// Renderable content of a single question as delivered by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub kind: AnswerKind,
    pub prompt: Option<String>,
    pub paragraph: Option<String>,
    pub options: Vec<String>,
    pub sub_questions: Vec<SubQuestion>,
    pub image_urls: Vec<String>,
    pub hint: Option<String>,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, kind: AnswerKind) -> Self {
        Self {
            id,
            kind,
            prompt: None,
            paragraph: None,
            options: Vec::new(),
            sub_questions: Vec::new(),
            image_urls: Vec::new(),
            hint: None,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn prompt_paragraphs(&self) -> Vec<&str> {
        self.prompt.as_deref().map(split_paragraphs).unwrap_or_default()
    }

    #[must_use]
    pub fn passage_paragraphs(&self) -> Vec<&str> {
        self.paragraph
            .as_deref()
            .map(split_paragraphs)
            .unwrap_or_default()
    }
}

/// Splits text on line breaks, dropping blank lines.
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_skip_blank_lines() {
        let text = "First line\n\n  \nSecond line\r\nThird";
        assert_eq!(
            split_paragraphs(text),
            vec!["First line", "Second line", "Third"]
        );
    }

    #[test]
    fn question_without_prompt_has_no_paragraphs() {
        let q = Question::new(QuestionId::new(1), AnswerKind::Spoken);
        assert!(q.prompt_paragraphs().is_empty());
        assert!(q.passage_paragraphs().is_empty());
    }
}
