//! Planner loop — reads submissions from a channel and drives one session.

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::assets::BackgroundImage;
use crate::channels::{Channel, IncomingMessage, OutgoingResponse, StatusUpdate};
use crate::config::{APP_TITLE, PlannerConfig};
use crate::error;
use crate::export::DocumentExporter;
use crate::llm::{LlmTextGenerator, create_provider};
use crate::wellness::{DialogueDriver, PlanDelivery, Session};

/// Control commands recognised before input reaches the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Restart,
    Input(String),
}

impl Command {
    pub fn parse(content: &str) -> Self {
        let trimmed = content.trim();
        match trimmed.to_lowercase().as_str() {
            "/quit" | "/exit" => Self::Quit,
            "/restart" | "/new" => Self::Restart,
            _ => Self::Input(content.to_string()),
        }
    }
}

pub struct Planner {
    channel: Arc<dyn Channel>,
    driver: DialogueDriver,
    output_dir: PathBuf,
}

impl Planner {
    pub fn new(channel: Arc<dyn Channel>, driver: DialogueDriver, output_dir: PathBuf) -> Self {
        Self {
            channel,
            driver,
            output_dir,
        }
    }

    /// Wire the configured LLM backend, the optional background image and
    /// the output directory around `channel`.
    pub async fn from_config(
        config: &PlannerConfig,
        channel: Arc<dyn Channel>,
    ) -> error::Result<Self> {
        let llm = create_provider(&config.llm)?;
        let generator = Arc::new(LlmTextGenerator::new(llm, config.generation.clone()));
        let background = BackgroundImage::discover(&config.asset_dir).await;
        let exporter = DocumentExporter::new(APP_TITLE).with_background(background);
        Ok(Self::new(
            channel,
            DialogueDriver::new(generator, exporter),
            config.output_dir.clone(),
        ))
    }

    /// Run until the channel closes, `/quit` arrives, or Ctrl+C.
    ///
    /// Returns the session as it stood when the loop ended.
    pub async fn run(&self) -> error::Result<Session> {
        let mut stream = self.channel.start().await?;
        let mut session = Session::new();
        self.greet(&mut session).await;
        info!(channel = self.channel.name(), session_id = %session.id(), "Planner ready");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = stream.next() => match msg {
                    Some(m) => m,
                    None => {
                        info!("Channel stream ended, shutting down...");
                        break;
                    }
                }
            };

            match Command::parse(&message.content) {
                Command::Quit => {
                    info!(session_id = %session.id(), "Quit command received");
                    break;
                }
                Command::Restart => {
                    info!(old_session = %session.id(), "Restarting session");
                    session = Session::new();
                    self.status(StatusUpdate::Status("Starting a new plan".into()), &message)
                        .await;
                    self.greet(&mut session).await;
                }
                Command::Input(text) => self.handle(&mut session, &message, &text).await,
            }
        }

        if let Err(e) = self.channel.shutdown().await {
            warn!(error = %e, "Channel shutdown failed");
        }
        Ok(session)
    }

    async fn greet(&self, session: &mut Session) {
        let start = IncomingMessage::new(self.channel.name(), "planner", "");
        for line in self.driver.start(session) {
            self.reply(&start, line).await;
        }
    }

    async fn handle(&self, session: &mut Session, message: &IncomingMessage, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.driver.will_generate(session) {
            self.status(StatusUpdate::Thinking("Thinking...".into()), message)
                .await;
        }

        let output = self.driver.handle_turn(session, text).await;
        debug!(
            session_id = %session.id(),
            step = session.step(),
            replies = output.replies.len(),
            "Turn complete"
        );
        for line in output.replies {
            self.reply(message, line).await;
        }
        if let Some(delivery) = output.delivery {
            self.save(session, message, delivery).await;
        }
    }

    async fn save(&self, session: &Session, message: &IncomingMessage, delivery: PlanDelivery) {
        let status = match delivery.document {
            Ok(document) => match self
                .driver
                .exporter()
                .save(&self.output_dir, session.name(), &document)
                .await
            {
                Ok(saved) => StatusUpdate::Saved {
                    pdf: saved.pdf,
                    html: saved.html,
                },
                Err(e) => {
                    error!(session_id = %session.id(), error = %e, "Could not save plan");
                    StatusUpdate::Error(format!("Could not save {}: {e}", delivery.file_name))
                }
            },
            Err(e) => StatusUpdate::Error(format!("Could not create {}: {e}", delivery.file_name)),
        };
        self.status(status, message).await;
    }

    async fn reply(&self, message: &IncomingMessage, line: String) {
        if let Err(e) = self
            .channel
            .respond(message, OutgoingResponse::text(line))
            .await
        {
            warn!(channel = self.channel.name(), error = %e, "Failed to send reply");
        }
    }

    async fn status(&self, status: StatusUpdate, message: &IncomingMessage) {
        if let Err(e) = self.channel.send_status(status, &message.metadata).await {
            warn!(channel = self.channel.name(), error = %e, "Failed to send status");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream;

    use super::*;
    use crate::channels::MessageStream;
    use crate::error::{ChannelError, Error, LlmError};
    use crate::llm::TextGenerator;
    use crate::wellness::prompts;

    /// Channel that replays fixed input and records everything sent back.
    struct ScriptedChannel {
        inputs: Vec<String>,
        fail_start: bool,
        replies: Mutex<Vec<String>>,
        statuses: Mutex<Vec<StatusUpdate>>,
    }

    impl ScriptedChannel {
        fn new(inputs: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                fail_start: false,
                replies: Mutex::new(Vec::new()),
                statuses: Mutex::new(Vec::new()),
            })
        }

        fn replies(&self) -> Vec<String> {
            self.replies.lock().unwrap().clone()
        }

        fn statuses(&self) -> Vec<StatusUpdate> {
            self.statuses.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Channel for ScriptedChannel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            if self.fail_start {
                return Err(ChannelError::StartupFailed {
                    name: "scripted".to_string(),
                    reason: "no terminal".to_string(),
                });
            }
            let messages: Vec<IncomingMessage> = self
                .inputs
                .iter()
                .map(|s| IncomingMessage::new("scripted", "tester", s))
                .collect();
            Ok(Box::pin(stream::iter(messages)))
        }

        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.replies.lock().unwrap().push(response.content);
            Ok(())
        }

        async fn send_status(
            &self,
            status: StatusUpdate,
            _metadata: &serde_json::Value,
        ) -> Result<(), ChannelError> {
            self.statuses.lock().unwrap().push(status);
            Ok(())
        }
    }

    struct CannedGenerator;

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            if prompt.starts_with("Create a 7-day") {
                Ok("| Day | Morning |\n|---|---|\n| Monday | Walk |".to_string())
            } else {
                Ok("You're doing great.".to_string())
            }
        }
    }

    fn planner(channel: Arc<ScriptedChannel>, output_dir: PathBuf) -> Planner {
        planner_with(channel, output_dir, DocumentExporter::new("Wellness Plan"))
    }

    fn planner_with(
        channel: Arc<ScriptedChannel>,
        output_dir: PathBuf,
        exporter: DocumentExporter,
    ) -> Planner {
        let driver = DialogueDriver::new(Arc::new(CannedGenerator), exporter);
        Planner::new(channel, driver, output_dir)
    }

    const FULL_RUN: &[&str] = &[
        "postpartum",
        "I'm Dana",
        "6 weeks",
        "tired",
        "c-section",
        "walks",
        "yes",
        "more sleep",
    ];

    #[test]
    fn command_parsing() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("  /EXIT "), Command::Quit);
        assert_eq!(Command::parse("/restart"), Command::Restart);
        assert_eq!(
            Command::parse(" I am pregnant "),
            Command::Input(" I am pregnant ".to_string())
        );
    }

    #[tokio::test]
    async fn greets_before_any_input() {
        let channel = ScriptedChannel::new(&[]);
        let dir = tempfile::tempdir().unwrap();
        let session = planner(channel.clone(), dir.path().to_path_buf())
            .run()
            .await
            .unwrap();
        assert_eq!(channel.replies(), vec![prompts::GREETING.to_string()]);
        assert_eq!(session.step(), 1);
    }

    #[tokio::test]
    async fn full_run_saves_pdf_and_html() {
        let channel = ScriptedChannel::new(FULL_RUN);
        let dir = tempfile::tempdir().unwrap();
        let session = planner(channel.clone(), dir.path().to_path_buf())
            .run()
            .await
            .unwrap();

        assert!(session.plan_generated());
        let pdf = dir.path().join("Dana_wellness_plan.pdf");
        let html = dir.path().join("Dana_wellness_plan.html");
        assert!(channel.statuses().contains(&StatusUpdate::Saved {
            pdf: pdf.clone(),
            html: html.clone(),
        }));
        assert!(std::fs::read(pdf).unwrap().starts_with(b"%PDF"));
        let page = std::fs::read_to_string(html).unwrap();
        assert!(page.contains("<td>Walk</td>"));
        assert!(!page.contains("background-image"));
        assert!(channel.replies().iter().any(|r| r.contains("| Monday | Walk |")));
    }

    #[tokio::test]
    async fn saved_html_embeds_background_image() {
        let assets = tempfile::tempdir().unwrap();
        std::fs::write(assets.path().join("background.png"), b"png-bytes").unwrap();
        let background = BackgroundImage::discover(assets.path()).await;
        assert!(background.is_some());
        let exporter = DocumentExporter::new("Wellness Plan").with_background(background);

        let channel = ScriptedChannel::new(FULL_RUN);
        let out = tempfile::tempdir().unwrap();
        planner_with(channel.clone(), out.path().to_path_buf(), exporter)
            .run()
            .await
            .unwrap();

        let html = out.path().join("Dana_wellness_plan.html");
        assert!(channel
            .statuses()
            .iter()
            .any(|s| matches!(s, StatusUpdate::Saved { html: saved, .. } if *saved == html)));
        let page = std::fs::read_to_string(&html).unwrap();
        assert!(page.contains("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn from_config_builds_a_runnable_planner() {
        let assets = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let asset_dir = assets.path().display().to_string();
        let output_dir = out.path().display().to_string();
        let config = PlannerConfig::from_lookup(|key| match key {
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            "WELLNESS_ASSET_DIR" => Some(asset_dir.clone()),
            "WELLNESS_OUTPUT_DIR" => Some(output_dir.clone()),
            _ => None,
        })
        .unwrap();

        let channel = ScriptedChannel::new(&["/quit"]);
        let planner = Planner::from_config(&config, channel.clone()).await.unwrap();
        assert_eq!(planner.output_dir, out.path());

        // quitting before any generation never touches the network
        let session = planner.run().await.unwrap();
        assert_eq!(session.step(), 1);
        assert_eq!(channel.replies(), vec![prompts::GREETING.to_string()]);
    }

    #[tokio::test]
    async fn thinking_status_only_for_generation_turns() {
        let channel = ScriptedChannel::new(FULL_RUN);
        let dir = tempfile::tempdir().unwrap();
        planner(channel.clone(), dir.path().to_path_buf())
            .run()
            .await
            .unwrap();

        let thinking = channel
            .statuses()
            .iter()
            .filter(|s| matches!(s, StatusUpdate::Thinking(_)))
            .count();
        // one per answer; phase and name turns never generate
        assert_eq!(thinking, 6);
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let channel = ScriptedChannel::new(&["pregnant", "/quit", "Sarah"]);
        let dir = tempfile::tempdir().unwrap();
        let session = planner(channel.clone(), dir.path().to_path_buf())
            .run()
            .await
            .unwrap();
        assert_eq!(session.step(), 2);
        assert!(session.name().is_empty());
    }

    #[tokio::test]
    async fn restart_starts_a_fresh_session() {
        let channel = ScriptedChannel::new(&["pregnant", "/restart", "postpartum"]);
        let dir = tempfile::tempdir().unwrap();
        let session = planner(channel.clone(), dir.path().to_path_buf())
            .run()
            .await
            .unwrap();

        assert_eq!(session.phase(), Some(crate::wellness::Phase::Postpartum));
        let greetings = channel
            .replies()
            .iter()
            .filter(|r| r.as_str() == prompts::GREETING)
            .count();
        assert_eq!(greetings, 2);
        assert!(channel
            .statuses()
            .contains(&StatusUpdate::Status("Starting a new plan".to_string())));
    }

    #[tokio::test]
    async fn startup_failure_is_returned() {
        let channel = Arc::new(ScriptedChannel {
            inputs: Vec::new(),
            fail_start: true,
            replies: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
        });
        let dir = tempfile::tempdir().unwrap();
        let err = planner(channel.clone(), dir.path().to_path_buf())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::StartupFailed { .. })));
        assert!(channel.replies().is_empty());
    }

    #[tokio::test]
    async fn unwritable_output_dir_reports_error_status() {
        let dir = tempfile::tempdir().unwrap();
        // a file where the output directory should be
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"").unwrap();

        let channel = ScriptedChannel::new(FULL_RUN);
        let session = planner(channel.clone(), blocked).run().await.unwrap();

        assert!(session.plan_generated());
        assert!(channel
            .statuses()
            .iter()
            .any(|s| matches!(s, StatusUpdate::Error(msg) if msg.contains("Dana_wellness_plan.pdf"))));
    }
}
