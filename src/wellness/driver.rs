//! DialogueDriver — applies the script to a session, calls the text
//! generator, and hands the finished plan to the exporter.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::ExportError;
use crate::export::{DocumentExporter, ExportedDocument, plan_file_name};
use crate::llm::TextGenerator;

use super::model::{GeneratedPlan, Speaker};
use super::prompts;
use super::questions;
use super::session::Session;
use super::state::{DialogueState, Transition};

/// The finished plan and its export.
#[derive(Debug)]
pub struct PlanDelivery {
    pub plan: GeneratedPlan,
    /// Suggested download name, `{name}_wellness_plan.pdf`.
    pub file_name: String,
    /// Export failure affects only the download; the plan text is already
    /// in the transcript.
    pub document: Result<ExportedDocument, ExportError>,
}

/// Everything one turn produced.
#[derive(Debug)]
pub struct TurnOutput {
    /// Assistant lines to show, in order.
    pub replies: Vec<String>,
    /// What the state machine did with the input, if any input was consumed.
    pub transition: Option<Transition>,
    /// Set on the turn that produced the plan.
    pub delivery: Option<PlanDelivery>,
}

impl TurnOutput {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            transition: None,
            delivery: None,
        }
    }
}

/// Drives a session through the question script.
pub struct DialogueDriver {
    generator: Arc<dyn TextGenerator>,
    exporter: DocumentExporter,
}

impl DialogueDriver {
    pub fn new(generator: Arc<dyn TextGenerator>, exporter: DocumentExporter) -> Self {
        Self {
            generator,
            exporter,
        }
    }

    pub fn exporter(&self) -> &DocumentExporter {
        &self.exporter
    }

    /// Show the greeting if the session has not been greeted yet.
    pub fn start(&self, session: &mut Session) -> Vec<String> {
        let mut out = TurnOutput::new();
        self.greet_if_needed(session, &mut out);
        out.replies
    }

    /// Whether the next turn for this session will call the text generator.
    pub fn will_generate(&self, session: &Session) -> bool {
        match session.state() {
            DialogueState::AwaitingAnswer(_) => true,
            DialogueState::Complete => !session.plan_generated(),
            _ => false,
        }
    }

    /// Process one user submission.
    ///
    /// Blank input is ignored; anything else is recorded as typed. Generation failures never abort the turn:
    /// a failed encouragement is replaced by a fallback line and the script
    /// still advances; a failed plan leaves the plan flag unset so the next
    /// submission retries it.
    pub async fn handle_turn(&self, session: &mut Session, input: &str) -> TurnOutput {
        let mut out = TurnOutput::new();
        if input.trim().is_empty() {
            return out;
        }

        self.greet_if_needed(session, &mut out);
        session.push(Speaker::User, input);

        let (next, transition) = session.state().advance(input);
        debug!(
            session_id = %session.id(),
            from = %session.state(),
            to = %next,
            "Dialogue transition"
        );

        match &transition {
            Transition::Greeted => {}
            Transition::PhaseRejected => {
                say(session, &mut out, prompts::PHASE_REPROMPT);
                out.transition = Some(Transition::PhaseRejected);
                return out;
            }
            Transition::PhaseSelected(phase) => {
                if !session.select_phase(*phase) {
                    warn!(session_id = %session.id(), "Phase already chosen; keeping the first");
                }
                info!(session_id = %session.id(), phase = %phase, "Phase selected");
                say(session, &mut out, prompts::NAME_QUESTION);
            }
            Transition::NameCaptured(name) => {
                session.set_name(name.clone());
                say(session, &mut out, prompts::welcome(name));
                if let Some(first) = session.phase().and_then(|p| questions::question(p, 0)) {
                    say(session, &mut out, first);
                }
            }
            Transition::Answered { index, answer } => {
                session.record_answer(answer.clone());
                self.encourage(session, &mut out, *index, answer).await;
                if let DialogueState::AwaitingAnswer(next_index) = next {
                    if let Some(q) = session.phase().and_then(|p| questions::question(p, next_index)) {
                        say(session, &mut out, q);
                    }
                }
            }
            Transition::Ignored => {
                if session.plan_generated() {
                    say(session, &mut out, prompts::SESSION_DONE_NOTICE);
                }
            }
        }
        session.set_state(next);
        out.transition = Some(transition);

        if session.state().is_terminal() && !session.plan_generated() {
            self.deliver_plan(session, &mut out).await;
        }
        out
    }

    fn greet_if_needed(&self, session: &mut Session, out: &mut TurnOutput) {
        if session.state() == DialogueState::Greeting {
            let (next, _) = session.state().advance("");
            say(session, out, prompts::GREETING);
            session.set_state(next);
        }
    }

    async fn encourage(&self, session: &mut Session, out: &mut TurnOutput, index: usize, answer: &str) {
        let Some(phase) = session.phase() else {
            return;
        };
        let Some(question) = questions::question(phase, index) else {
            return;
        };
        let prompt = prompts::encouragement_prompt(phase, session.name(), question, answer);
        match self.generator.generate(&prompt).await {
            Ok(text) => say(session, out, text),
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    question = index,
                    error = %e,
                    "Encouragement generation failed"
                );
                say(session, out, prompts::ENCOURAGEMENT_FALLBACK);
            }
        }
    }

    async fn deliver_plan(&self, session: &mut Session, out: &mut TurnOutput) {
        let Some(phase) = session.phase() else {
            return;
        };
        let prompt = prompts::plan_prompt(phase, session.name(), &session.qa_pairs());
        say(session, out, prompts::GENERATING_NOTICE);
        info!(session_id = %session.id(), phase = %phase, "Generating wellness plan");

        let text = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!(session_id = %session.id(), error = %e, "Plan generation failed");
                say(session, out, prompts::PLAN_RETRY_NOTICE);
                return;
            }
        };

        let plan = GeneratedPlan::new(text);
        say(session, out, plan.text.clone());
        session.record_plan(plan.clone());

        let document = self.exporter.export(&plan.text);
        if let Err(e) = &document {
            error!(session_id = %session.id(), error = %e, "Plan export failed");
        }
        out.delivery = Some(PlanDelivery {
            plan,
            file_name: plan_file_name(session.name()),
            document,
        });
    }
}

/// Record an assistant line in both the transcript and the turn output.
fn say(session: &mut Session, out: &mut TurnOutput, text: impl Into<String>) {
    let text = text.into();
    session.push(Speaker::Assistant, text.clone());
    out.replies.push(text);
}
