use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use wellness_planner::channels::CliChannel;
use wellness_planner::config::{APP_TITLE, PlannerConfig};
use wellness_planner::planner::Planner;

/// Stderr logging by default; a daily rolling file when a log dir is set.
/// The returned guard must outlive the program to flush file logs.
fn init_tracing(config: &PlannerConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wellness-planner.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let config = PlannerConfig::from_env().context("invalid configuration")?;
    let _log_guard = init_tracing(&config);

    eprintln!("🤰 {} v{}", APP_TITLE, env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {} ({})", config.llm.backend, config.llm.model);
    eprintln!("   Plans are saved to: {}", config.output_dir.display());
    eprintln!("   Type /restart to start over, /quit to exit.\n");

    let planner = Planner::from_config(&config, Arc::new(CliChannel::new()))
        .await
        .context("failed to set up the planner")?;

    let session = planner.run().await?;
    tracing::info!(
        session_id = %session.id(),
        step = session.step(),
        plan_generated = session.plan_generated(),
        "Planner exited"
    );
    Ok(())
}
