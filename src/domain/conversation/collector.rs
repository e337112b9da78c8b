//! Answer collection - walks one question batch in strict order.

use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::StateMachine;

use super::ConversationTurn;

/// Progress through a question batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "state", content = "turn_index", rename_all = "snake_case")]
pub enum CollectorState {
    Idle,
    AwaitingAnswer(usize),
    BatchComplete,
}

impl StateMachine for CollectorState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use CollectorState::*;
        match (self, target) {
            (Idle, AwaitingAnswer(0)) => true,
            (AwaitingAnswer(i), AwaitingAnswer(j)) => *j == i + 1,
            (AwaitingAnswer(_), BatchComplete) => true,
            _ => false,
        }
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use CollectorState::*;
        match self {
            Idle => vec![AwaitingAnswer(0)],
            AwaitingAnswer(i) => vec![AwaitingAnswer(i + 1), BatchComplete],
            BatchComplete => vec![],
        }
    }
}

/// Local rejections. None of these change collector state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectorError {
    #[error("question batch is empty")]
    EmptyBatch,

    #[error("answer is empty")]
    EmptyAnswerRejected,

    #[error("answer for turn {submitted} is stale (awaiting {awaiting:?})")]
    StaleSubmission {
        submitted: usize,
        awaiting: Option<usize>,
    },
}

/// Result of an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The turn at this index is now awaiting an answer.
    Next(usize),
    BatchComplete,
}

/// Collects exactly one answer per turn, in index order.
#[derive(Debug, Clone)]
pub struct AnswerCollector {
    turns: Vec<ConversationTurn>,
    state: CollectorState,
}

impl AnswerCollector {
    /// Starts collecting on a fresh batch.
    ///
    /// # Errors
    ///
    /// - `EmptyBatch` if `turns` is empty
    pub fn load(turns: Vec<ConversationTurn>) -> Result<Self, CollectorError> {
        if turns.is_empty() {
            return Err(CollectorError::EmptyBatch);
        }
        Ok(Self {
            turns,
            state: CollectorState::AwaitingAnswer(0),
        })
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn into_turns(self) -> Vec<ConversationTurn> {
        self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Index of the turn awaiting an answer.
    pub fn awaiting(&self) -> Option<usize> {
        match self.state {
            CollectorState::AwaitingAnswer(i) => Some(i),
            _ => None,
        }
    }

    /// The turn awaiting an answer, with its index.
    pub fn current_turn(&self) -> Option<(usize, &ConversationTurn)> {
        self.awaiting().map(|i| (i, &self.turns[i]))
    }

    /// Records an answer for `turn_index`.
    ///
    /// # Errors
    ///
    /// - `StaleSubmission` if `turn_index` is not the turn awaiting an answer
    /// - `EmptyAnswerRejected` if the trimmed answer is empty
    pub fn submit(&mut self, turn_index: usize, answer: &str) -> Result<Advance, CollectorError> {
        let awaiting = self.awaiting();
        if awaiting != Some(turn_index) {
            return Err(CollectorError::StaleSubmission {
                submitted: turn_index,
                awaiting,
            });
        }

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(CollectorError::EmptyAnswerRejected);
        }

        self.turns[turn_index].answer_text = Some(answer.to_string());

        let next = if turn_index + 1 < self.turns.len() {
            CollectorState::AwaitingAnswer(turn_index + 1)
        } else {
            CollectorState::BatchComplete
        };
        debug_assert!(self.state.can_transition_to(&next));
        self.state = next;

        Ok(match next {
            CollectorState::AwaitingAnswer(i) => Advance::Next(i),
            _ => Advance::BatchComplete,
        })
    }
}
