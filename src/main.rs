use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
mod breath;
mod config;
mod notify;
mod render;
mod ws;

use breath::breath::{Pattern, TickOutcome};
use breath::pacer::{OutcomeReceiver, Pacer, create_outcome_channel};
use config::config::{Args, Config};
use render::frame::{Frame, legend};

/// Append-only, timestamped record of what the pacer did.
#[derive(Debug, Clone)]
struct SessionLog {
    path: Option<PathBuf>,
}

impl SessionLog {
    fn new(path: Option<PathBuf>) -> Self {
        let log = Self { path };
        log.log(&format!(
            "=== Session started at {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        log
    }

    fn log_to_file(path: &Path, message: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", message)?;
        Ok(())
    }

    fn log(&self, message: &str) {
        if let Some(ref path) = self.path {
            if let Err(e) = Self::log_to_file(path, message) {
                tracing::warn!("Failed to write session log {}: {}", path.display(), e);
            }
        }
    }

    fn event(&self, message: &str) {
        self.log(&format!("[{}] {}", Local::now().format("%H:%M:%S"), message));
    }
}

/// Record phase changes and completed cycles, notifying if asked to.
async fn process_outcomes(
    mut outcome_rx: OutcomeReceiver,
    session_log: SessionLog,
    pattern: Pattern,
    notify: bool,
) {
    while let Some(outcome) = outcome_rx.recv().await {
        match outcome {
            TickOutcome::PhaseChanged { to, .. } => {
                session_log.event(&format!("Phase changed to {}", to.as_str()));
            }
            TickOutcome::CycleCompleted { cycles } => {
                let message = notify::cycle_message(cycles, &pattern);
                session_log.event(&message);
                if notify {
                    if let Err(e) = notify::send_notification(&message) {
                        tracing::warn!("Failed to send notification: {}", e);
                    }
                }
            }
            TickOutcome::Counted { .. } | TickOutcome::Idle => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args(Args::parse())?;

    // Create log directory if needed
    if let Some(ref path) = config.log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!("Logging to: {}", path.display());
    }

    let session_log = SessionLog::new(config.log_file.clone());
    let (outcome_tx, outcome_rx) = create_outcome_channel();
    let pacer = Arc::new(Pacer::new(config.pattern, Some(outcome_tx)));

    tokio::spawn(process_outcomes(
        outcome_rx,
        session_log.clone(),
        config.pattern,
        config.notify,
    ));

    if config.autostart {
        pacer.start();
        session_log.event("Breathing started");
    }

    let result = if config.daemon {
        run_daemon_mode(&config, Arc::clone(&pacer)).await
    } else {
        run_terminal_mode(Arc::clone(&pacer), &session_log).await
    };

    pacer.stop();
    session_log.event("Session ended");
    result
}

/// Serve the pacer to a browser front end until Ctrl+C.
async fn run_daemon_mode(
    config: &Config,
    pacer: Arc<Pacer>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Zen Breath daemon: {}", legend(&config.pattern));

    tokio::select! {
        result = ws::websocket_server::start_websocket_server(config.addr, pacer) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}

/// Draw the pacer on one terminal line; Enter toggles, `q` quits.
async fn run_terminal_mode(
    pacer: Arc<Pacer>,
    session_log: &SessionLog,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Zen Breath");
    println!("4 · 7 · 8 BREATHING   ({})", legend(&pacer.pattern()));
    println!("Press Enter to begin or pause, q then Enter to quit\n");

    let color = std::env::var_os("NO_COLOR").is_none();
    let mut snapshots = pacer.subscribe();
    let draw = tokio::spawn(async move {
        loop {
            let snapshot = *snapshots.borrow_and_update();
            print!("\r{}", Frame::from_snapshot(&snapshot).to_line(color));
            let _ = std::io::stdout().flush();
            if snapshots.changed().await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line?.as_deref().map(str::trim) {
                    Some("q") | None => break,
                    Some("") | Some("s") => {
                        let running = pacer.toggle();
                        session_log.event(if running { "Breathing started" } else { "Breathing stopped" });
                    }
                    Some(other) => tracing::debug!("Ignoring input {:?}", other),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    draw.abort();
    println!();
    Ok(())
}
