//! Startup and the interactive command loop.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use dialoguer::Input;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use formpilot_config::{Config, ConfigLoader, ConfigValidator};
use formpilot_core::{
    AutofillOrchestrator, FillAllReport, FillError, FillReport, NavigationOutcome, PromptBuilder,
};

use crate::backends::{build_backend, switch_backend};
use crate::command::{Command, HELP};

type InputLines = Lines<BufReader<Stdin>>;

/// Run the assistant until the user quits or interrupts.
pub(crate) async fn run(config_path: PathBuf) -> anyhow::Result<()> {
    let mut config = ConfigLoader::load_or_default(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("{}: {}", warning.path, warning.message);
    }

    let context = load_context(&mut config, &config_path)?;
    offer_model_change(&mut config, &config_path)?;

    let (_client, page) = formpilot_page_cdp::connect_active_page(&config.browser.endpoint)
        .await
        .context("attaching to the browser")?;
    let backend = build_backend(&config)?;

    let cancel = CancellationToken::new();
    let mut orchestrator =
        AutofillOrchestrator::new(Arc::new(page), backend, config.generation_config())
            .with_context(context)
            .with_prompt_builder(PromptBuilder::new(
                config.prompt.include_page_markup,
                config.prompt.max_markup_chars,
            ))
            .with_cancellation(cancel.clone())
            .with_chunk_sink(Box::new(|chunk: &str| {
                print!("{}", chunk);
                let _ = std::io::stdout().flush();
            }));

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        let work = execute(command, &mut orchestrator, &mut config, &config_path, &mut lines);
        tokio::pin!(work);
        let interrupted = tokio::select! {
            result = &mut work => {
                report_error(result);
                false
            }
            _ = tokio::signal::ctrl_c() => {
                // Let the in-flight command observe the token and unwind.
                cancel.cancel();
                report_error(work.await);
                true
            }
        };
        if interrupted {
            println!("\nInterrupted.");
            break;
        }
    }

    info!("Session ended");
    Ok(())
}

fn report_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        warn!("Command failed: {:#}", e);
        println!("Error: {:#}", e);
    }
}

async fn execute(
    command: Command,
    orchestrator: &mut AutofillOrchestrator,
    config: &mut Config,
    config_path: &Path,
    lines: &mut InputLines,
) -> anyhow::Result<()> {
    match command {
        Command::NewApplication => {
            orchestrator.new_application();
            println!("Started a new application.");
        }
        Command::FillOne => {
            let filled = orchestrator.fill_one_field().await;
            print_fill(filled)?;
        }
        Command::FillAll => {
            let report = orchestrator.fill_all_fields().await?;
            print_report(&report);
        }
        Command::Previous => print_navigation(orchestrator.previous_answer().await?),
        Command::Next => print_navigation(orchestrator.next_answer().await?),
        Command::ChangeModel(model) => {
            let model = match model {
                Some(model) => model,
                None => {
                    print!("Model [{}]: ", config.generation.model);
                    let _ = std::io::stdout().flush();
                    lines.next_line().await?.unwrap_or_default().trim().to_string()
                }
            };
            if !model.is_empty() && model != config.generation.model {
                config.generation.model = model;
                apply_settings(orchestrator, config, config_path)?;
            }
            println!("Model: {}", config.generation.model);
        }
        Command::SetStrategy(strategy) => {
            config.generation.decoding_strategy = strategy;
            apply_settings(orchestrator, config, config_path)?;
            println!("Decoding strategy: {}", strategy);
        }
        Command::SetBackend(kind) => {
            if kind != config.generation.backend {
                let backend = switch_backend(config, kind)?;
                orchestrator.set_backend(backend);
                apply_settings(orchestrator, config, config_path)?;
            }
            println!("Backend: {}", config.generation.backend);
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

/// Persist `config` and hand the new settings to the orchestrator.
fn apply_settings(
    orchestrator: &mut AutofillOrchestrator,
    config: &Config,
    config_path: &Path,
) -> anyhow::Result<()> {
    ConfigValidator::validate(config).into_result()?;
    ConfigLoader::save(config_path, config)?;
    orchestrator.set_generation_config(config.generation_config());
    Ok(())
}

fn print_fill(result: Result<FillReport, FillError>) -> anyhow::Result<()> {
    match result {
        Ok(filled) => {
            println!("\n{} ({}): {}", filled.label, filled.identifier, filled.answer);
            Ok(())
        }
        Err(FillError::NoActiveField) => {
            println!("No field has focus. Click into a field first.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &FillAllReport) {
    println!();
    for filled in &report.filled {
        println!("  filled  {} ({}): {}", filled.label, filled.identifier, filled.answer);
    }
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.descriptor.identifier, skipped.reason);
    }
    for failed in &report.failed {
        println!("  failed  {} ({}): {}", failed.label, failed.identifier, failed.error);
    }
    println!(
        "{} filled, {} skipped, {} failed{}",
        report.filled.len(),
        report.skipped.len(),
        report.failed.len(),
        if report.cancelled { " (interrupted)" } else { "" }
    );
}

fn print_navigation(outcome: NavigationOutcome) {
    match outcome {
        NavigationOutcome::NoHistory => println!("No previous answers for this field."),
        NavigationOutcome::Unchanged { .. } => println!("Already at the first answer."),
        NavigationOutcome::Moved { index, answer } => println!("[{}] {}", index + 1, answer),
        NavigationOutcome::Regenerated { index, answer } => {
            println!("\n[{}, new] {}", index + 1, answer)
        }
    }
}

/// Read the applicant context, asking for a file until one is readable.
fn load_context(config: &mut Config, config_path: &Path) -> anyhow::Result<String> {
    if let Some(path) = config.context_file.as_deref() {
        match read_context(path) {
            Ok(text) => return Ok(text),
            Err(e) => println!("Cannot read context file {}: {}", path, e),
        }
    }

    loop {
        let path: String = Input::new()
            .with_prompt("Path to a text file describing you (CV, experience, preferences)")
            .interact_text()?;
        match read_context(&path) {
            Ok(text) => {
                config.context_file = Some(path);
                ConfigLoader::save(config_path, config)?;
                return Ok(text);
            }
            Err(e) => println!("Cannot read {}: {}", path, e),
        }
    }
}

pub(crate) fn read_context(path: &str) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(ConfigLoader::expand_path(path.trim()))?;
    if text.trim().is_empty() {
        bail!("file is empty");
    }
    Ok(text)
}

fn offer_model_change(config: &mut Config, config_path: &Path) -> anyhow::Result<()> {
    let model: String = Input::new()
        .with_prompt(format!("Model (Enter keeps {})", config.generation.model))
        .allow_empty(true)
        .interact_text()?;
    let model = model.trim();
    if !model.is_empty() && model != config.generation.model {
        config.generation.model = model.to_string();
        ConfigLoader::save(config_path, config)?;
    }
    Ok(())
}
