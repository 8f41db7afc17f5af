//! Study records and the per-question cell state machine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hierarchy::BankId;

/// Answer state of a single question cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionState {
    #[default]
    Unset,
    Correct,
    Wrong,
}

impl QuestionState {
    /// Next state on toggle: unset → correct → wrong → unset.
    pub fn next(self) -> Self {
        match self {
            QuestionState::Unset => QuestionState::Correct,
            QuestionState::Correct => QuestionState::Wrong,
            QuestionState::Wrong => QuestionState::Unset,
        }
    }

    pub fn is_answered(self) -> bool {
        !matches!(self, QuestionState::Unset)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionState::Unset => "unset",
            QuestionState::Correct => "correct",
            QuestionState::Wrong => "wrong",
        }
    }
}

/// State of a question cell plus its independent bookmark flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionMark {
    #[serde(default)]
    pub state: QuestionState,
    #[serde(default)]
    pub bookmarked: bool,
}

impl QuestionMark {
    pub fn new(state: QuestionState) -> Self {
        Self {
            state,
            bookmarked: false,
        }
    }

    pub fn toggle_state(&mut self) -> QuestionState {
        self.state = self.state.next();
        self.state
    }

    pub fn toggle_bookmark(&mut self) -> bool {
        self.bookmarked = !self.bookmarked;
        self.bookmarked
    }

    pub fn is_blank(&self) -> bool {
        !self.state.is_answered() && !self.bookmarked
    }
}

/// One saved study session: the outcome of every question under a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecord {
    pub id: String,
    pub bank_id: BankId,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub per_question_outcome: BTreeMap<u32, QuestionMark>,
    pub timestamp: DateTime<Utc>,
}

impl StudyRecord {
    pub fn new(
        bank_id: BankId,
        path: Vec<String>,
        per_question_outcome: BTreeMap<u32, QuestionMark>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            bank_id,
            path,
            per_question_outcome,
            timestamp,
        }
    }

    /// First path segment, if any.
    pub fn subject(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    pub fn correct_count(&self) -> u64 {
        self.count(QuestionState::Correct)
    }

    pub fn wrong_count(&self) -> u64 {
        self.count(QuestionState::Wrong)
    }

    /// Questions marked correct or wrong; unset cells are not answers.
    pub fn answered_count(&self) -> u64 {
        self.correct_count() + self.wrong_count()
    }

    /// Question numbers with a correct or wrong outcome.
    pub fn answered_questions(&self) -> impl Iterator<Item = u32> + '_ {
        self.per_question_outcome
            .iter()
            .filter(|(_, mark)| mark.state.is_answered())
            .map(|(number, _)| *number)
    }

    fn count(&self, state: QuestionState) -> u64 {
        self.per_question_outcome
            .values()
            .filter(|mark| mark.state == state)
            .count() as u64
    }
}
