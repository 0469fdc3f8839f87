//! Dialogue state machine — tracks where the user is in the script.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::model::Phase;
use super::questions::QUESTION_COUNT;

/// Name used when the user's reply contains no capitalized word.
pub const DEFAULT_NAME: &str = "You";

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z]+").expect("valid name pattern"));

/// Pick the first capitalized word (`[A-Z][a-z]+`) out of free text.
pub fn extract_name(input: &str) -> String {
    NAME_PATTERN
        .find(input)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

/// Where the dialogue currently is.
///
/// Progresses linearly: Greeting → AwaitingPhase → AwaitingName →
/// AwaitingAnswer(0..QUESTION_COUNT) → Complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "question")]
pub enum DialogueState {
    Greeting,
    AwaitingPhase,
    AwaitingName,
    AwaitingAnswer(usize),
    Complete,
}

/// What a single `advance` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The greeting was shown; no input consumed.
    Greeted,
    /// Input named no phase; the same step must be retried.
    PhaseRejected,
    PhaseSelected(Phase),
    NameCaptured(String),
    /// The answer to question `index` was accepted.
    Answered { index: usize, answer: String },
    /// Input arrived after the script ended.
    Ignored,
}

impl Default for DialogueState {
    fn default() -> Self {
        Self::Greeting
    }
}

impl DialogueState {
    /// Script position as a step counter: 0 greeting, 1 phase, 2 name,
    /// `3 + i` for question `i`, `3 + QUESTION_COUNT` once complete.
    pub fn step(&self) -> usize {
        match self {
            Self::Greeting => 0,
            Self::AwaitingPhase => 1,
            Self::AwaitingName => 2,
            Self::AwaitingAnswer(i) => 3 + i,
            Self::Complete => 3 + QUESTION_COUNT,
        }
    }

    /// Whether the script has run out of questions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Pure transition function: consume `input` and return the next state
    /// plus what happened. Never performs I/O.
    pub fn advance(self, input: &str) -> (DialogueState, Transition) {
        match self {
            Self::Greeting => (Self::AwaitingPhase, Transition::Greeted),
            Self::AwaitingPhase => match Phase::detect(input) {
                Some(phase) => (Self::AwaitingName, Transition::PhaseSelected(phase)),
                None => (Self::AwaitingPhase, Transition::PhaseRejected),
            },
            Self::AwaitingName => (
                Self::AwaitingAnswer(0),
                Transition::NameCaptured(extract_name(input)),
            ),
            Self::AwaitingAnswer(index) => {
                let next = if index + 1 < QUESTION_COUNT {
                    Self::AwaitingAnswer(index + 1)
                } else {
                    Self::Complete
                };
                (
                    next,
                    Transition::Answered {
                        index,
                        answer: input.to_string(),
                    },
                )
            }
            Self::Complete => (Self::Complete, Transition::Ignored),
        }
    }
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greeting => write!(f, "greeting"),
            Self::AwaitingPhase => write!(f, "awaiting_phase"),
            Self::AwaitingName => write!(f, "awaiting_name"),
            Self::AwaitingAnswer(i) => write!(f, "awaiting_answer({i})"),
            Self::Complete => write!(f, "complete"),
        }
    }
}
