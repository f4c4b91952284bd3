//! Interactive walk through a quiz attached to an assistant message.

use dreamarc_protocol::{QuizDirective, QuizQuestion};
use thiserror::Error;

/// Errors returned while answering a quiz.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("option {index} out of range (options={len})")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("quiz has no questions")]
    Empty,
}

/// Feedback for one answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub correct: bool,
    pub selected_index: usize,
    /// `None` when the question's index points at no option.
    pub correct_index: Option<usize>,
    pub explanation: String,
}

/// Result of moving past a revealed question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizProgress {
    /// Now showing the question at this index.
    Next(usize),
    /// The last question was answered.
    Complete,
}

/// State of a quiz card.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: QuizDirective,
    current: usize,
    revealed: Option<QuizOutcome>,
    correct_answers: usize,
}

impl QuizSession {
    pub fn new(quiz: QuizDirective) -> Result<Self, QuizError> {
        if quiz.is_empty() {
            return Err(QuizError::Empty);
        }
        Ok(Self {
            quiz,
            current: 0,
            revealed: None,
            correct_answers: 0,
        })
    }

    /// Question currently on the card.
    pub fn current_question(&self) -> &QuizQuestion {
        &self.quiz.questions()[self.current]
    }

    /// Zero-based position of the current question.
    pub fn position(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.quiz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quiz.is_empty()
    }

    /// Outcome of the current question, once answered.
    pub fn revealed(&self) -> Option<&QuizOutcome> {
        self.revealed.as_ref()
    }

    pub fn correct_answers(&self) -> usize {
        self.correct_answers
    }

    /// Pick an option for the current question.
    ///
    /// Returns `Ok(None)` when the explanation is already showing; the first
    /// answer to a question is final.
    pub fn answer(&mut self, index: usize) -> Result<Option<QuizOutcome>, QuizError> {
        if self.revealed.is_some() {
            return Ok(None);
        }
        let question = self.current_question();
        if index >= question.options.len() {
            return Err(QuizError::OptionOutOfRange {
                index,
                len: question.options.len(),
            });
        }
        let correct_index = question.correct_option();
        let outcome = QuizOutcome {
            correct: correct_index == Some(index),
            selected_index: index,
            correct_index,
            explanation: question.explanation.clone(),
        };
        if outcome.correct {
            self.correct_answers += 1;
        }
        self.revealed = Some(outcome.clone());
        Ok(Some(outcome))
    }

    /// Move to the next question after the current one was answered.
    ///
    /// Before an answer is given this stays on the current question.
    pub fn advance(&mut self) -> QuizProgress {
        if self.revealed.is_none() {
            return QuizProgress::Next(self.current);
        }
        if self.current + 1 >= self.quiz.len() {
            return QuizProgress::Complete;
        }
        self.current += 1;
        self.revealed = None;
        QuizProgress::Next(self.current)
    }
}
