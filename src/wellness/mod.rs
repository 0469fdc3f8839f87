//! Wellness dialogue — the scripted conversation that ends in a plan.
//!
//! The user picks a phase (pregnancy or postpartum), gives a name, and
//! answers six phase-specific questions. Each answer gets a short generated
//! encouragement; once the last one is in, the answers are aggregated into a
//! single prompt and the resulting 7-day plan is exported as HTML and PDF.
//!
//! `DialogueState::advance` is the pure transition function. `DialogueDriver`
//! wraps it with the side effects: transcript, generation calls, export.

pub mod driver;
pub mod model;
pub mod prompts;
pub mod questions;
pub mod session;
pub mod state;

pub use driver::{DialogueDriver, PlanDelivery, TurnOutput};
pub use model::{GeneratedPlan, Phase, Speaker, TranscriptEntry};
pub use questions::QUESTION_COUNT;
pub use session::Session;
pub use state::{DialogueState, Transition};
