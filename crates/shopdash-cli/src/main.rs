//! Shopdash - command-line admin dashboard for the shop catalog and orders.
//!
//! Every command restores the saved session first, then talks to the shop
//! API through the authenticated client in `shopdash-core`.

mod app;
mod command;
mod format;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use command::Command;
use shopdash_core::auth::SessionView;

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "shopdash.log";

/// Initialize the tracing subscriber for logging.
/// Returns the guard that flushes the log file on drop.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file = log_dir().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
        tracing_appender::non_blocking(appender)
    });

    match file {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn log_dir() -> Option<std::path::PathBuf> {
    let dir = shopdash_core::Config::default().cache_dir().ok()?.join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, command::USAGE);
            drop(log_guard);
            std::process::exit(2);
        }
    };

    info!(command = command.name(), "Shopdash starting");
    let mut app = App::new()?;

    if command != Command::Help {
        match app.start().await {
            SessionView::Dashboard => {}
            SessionView::Login | SessionView::Loading => {
                if command.needs_session() {
                    eprintln!("Not logged in.");
                }
            }
        }
    }

    if let Err(e) = app.run(command).await {
        eprintln!("Error: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }
    drop(log_guard);
    Ok(())
}
