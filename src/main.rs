//! Elidune Desk - library circulation console

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use elidune_desk::{clock::SystemClock, config::LoggingConfig, console::Console, AppConfig, AppState};

#[derive(Parser, Debug)]
#[command(name = "elidune-desk", version, about = "Library circulation console")]
struct Cli {
    /// Configuration file (defaults to config/default.toml when present)
    #[arg(short, long, env = "ELIDUNE_CONFIG")]
    config: Option<String>,

    /// Directory holding the JSON data files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    let _guard = init_tracing(&config.logging)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.storage.data_dir.display(),
        "Starting Elidune Desk"
    );

    let reports_dir = config.storage.data_dir.join("reports");
    let state = AppState::open(config, Arc::new(SystemClock)).context("Failed to open the data directory")?;

    let stdin = io::stdin();
    let mut console = Console::new((*state.services).clone(), stdin.lock(), io::stdout(), reports_dir);
    console.run().context("Console session failed")?;

    tracing::info!("Session closed");
    Ok(())
}

/// Warnings and errors go to stderr so they do not drown the menus; every event
/// passing the filter is written to `<directory>/system.log`.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.directory)
        .with_context(|| format!("Cannot create log directory {}", logging.directory.display()))?;
    let appender = tracing_appender::rolling::daily(&logging.directory, "system.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("elidune_desk={}", logging.level).into());

    let stderr_layer = match logging.format.as_str() {
        "json" => fmt::layer().json().with_writer(io::stderr).boxed(),
        _ => fmt::layer().with_writer(io::stderr).boxed(),
    };
    let file_layer = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer.with_filter(LevelFilter::WARN))
        .with(file_layer)
        .init();
    Ok(guard)
}
