//! FormPilot - job-application form autofill
//!
//! Attaches to a running browser, reads the focused form and fills it with
//! answers from a language model.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use formpilot_config::{Config, ConfigLoader};

mod app;
mod backends;
mod cli;
mod command;

use cli::{Cli, Commands, ConfigAction};

/// Get the FormPilot home directory (~/.formpilot).
fn formpilot_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".formpilot"))
        .unwrap_or_else(|| PathBuf::from(".formpilot"))
}

/// Initialize tracing with console and rolling file output.
fn init_tracing() -> anyhow::Result<()> {
    let log_dir = formpilot_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("formpilot")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop; keep it for the whole run.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(ConfigLoader::default_path);

    match cli.command {
        None | Some(Commands::Run) => {
            info!("Starting FormPilot v{}", env!("CARGO_PKG_VERSION"));
            app::run(config_path).await
        }
        Some(Commands::Config { action }) => handle_config_command(action, &config_path),
    }
}

fn handle_config_command(action: ConfigAction, path: &std::path::Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = ConfigLoader::load_or_default(path)?;
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            ConfigLoader::save(path, &Config::default())?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
