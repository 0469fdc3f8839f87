//! Per-user session state.
//!
//! A `Session` is created when a conversation starts and dropped when it
//! ends. Only the dialogue driver mutates it; everything else reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{GeneratedPlan, Phase, Speaker, TranscriptEntry};
use super::questions;
use super::state::DialogueState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    state: DialogueState,
    name: String,
    phase: Option<Phase>,
    answers: Vec<String>,
    transcript: Vec<TranscriptEntry>,
    plan: Option<GeneratedPlan>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            state: DialogueState::default(),
            name: String::new(),
            phase: None,
            answers: Vec::new(),
            transcript: Vec::new(),
            plan: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    /// Step counter derived from the dialogue state.
    pub fn step(&self) -> usize {
        self.state.step()
    }

    /// Captured name; empty until the name step has run.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn plan(&self) -> Option<&GeneratedPlan> {
        self.plan.as_ref()
    }

    pub fn plan_generated(&self) -> bool {
        self.plan.is_some()
    }

    /// Recorded answers paired with the questions they answer, in order.
    pub fn qa_pairs(&self) -> Vec<(&'static str, &str)> {
        let Some(phase) = self.phase else {
            return Vec::new();
        };
        questions::questions(phase)
            .iter()
            .copied()
            .zip(self.answers.iter().map(String::as_str))
            .collect()
    }

    /// Move to `next`. Moves that would lower the step are ignored.
    pub(crate) fn set_state(&mut self, next: DialogueState) {
        if next.step() >= self.state.step() {
            self.state = next;
        } else {
            tracing::warn!(
                session_id = %self.id,
                from = %self.state,
                to = %next,
                "Refusing backwards dialogue transition"
            );
        }
    }

    /// Set the phase. Returns false if it was already chosen.
    pub(crate) fn select_phase(&mut self, phase: Phase) -> bool {
        if self.phase.is_some() {
            return false;
        }
        self.phase = Some(phase);
        true
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn record_answer(&mut self, answer: impl Into<String>) {
        self.answers.push(answer.into());
    }

    /// Store the plan. Returns false if a plan already exists.
    pub(crate) fn record_plan(&mut self, plan: GeneratedPlan) -> bool {
        if self.plan.is_some() {
            return false;
        }
        self.plan = Some(plan);
        true
    }

    pub(crate) fn push(&mut self, role: Speaker, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry {
            role,
            text: text.into(),
            at: Utc::now(),
        });
    }
}
