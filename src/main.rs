//! Vigil CLI entry point.
//!
//! Provides `status`, `onboard`, `models`, and `run` subcommands over the
//! credential vault and the detection worker.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use zeroize::Zeroizing;

use vigil::config::VigilConfig;
use vigil::console::{Console, Screen};
use vigil::credentials::Credentials;
use vigil::input::InputSource;
use vigil::keys::KeyManager;
use vigil::selection::SelectionCommand;

/// Vigil — credential vault and detection-job dispatcher.
#[derive(Parser)]
#[command(name = "vigil", version, about)]
struct Cli {
    /// Config file (defaults to $VIGIL_CONFIG_PATH or ./vigil.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Show key and credential state.
    Status,
    /// Store notification credentials.
    Onboard {
        /// Account notifications are sent from.
        #[arg(long)]
        sender_email: String,
        /// Address that receives notifications.
        #[arg(long)]
        receiver_email: String,
        /// Replace credentials that are already stored.
        #[arg(long)]
        force: bool,
    },
    /// List the detection models in catalog order.
    Models,
    /// Launch the detection worker.
    Run {
        /// Read frames from this video instead of the webcam.
        #[arg(long)]
        video: Option<PathBuf>,
        /// Toggle a model by display name. Repeatable.
        #[arg(long = "model", value_name = "NAME")]
        models: Vec<String>,
        /// Send email notifications on detections.
        #[arg(long)]
        notify: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = VigilConfig::load(cli.config.as_deref())?;

    let _logging_guard = if config.logging.json_file {
        let logs_dir = config.paths.resolved_logs_dir()?;
        Some(vigil::logging::init_production(
            &logs_dir,
            "vigil.log",
            &config.logging.level,
        )?)
    } else {
        vigil::logging::init_cli(&config.logging.level)?;
        None
    };

    match cli.command {
        Command::Status => handle_status(&config),
        Command::Onboard {
            sender_email,
            receiver_email,
            force,
        } => handle_onboard(&config, sender_email, receiver_email, force),
        Command::Models => handle_models(),
        Command::Run {
            video,
            models,
            notify,
        } => handle_run(&config, video, &models, notify),
    }
}

/// Report key and credential state without revealing secrets.
fn handle_status(config: &VigilConfig) -> anyhow::Result<()> {
    let key_manager = KeyManager::new(&config.paths.key_file);
    println!(
        "key file:         {} ({})",
        config.paths.key_file.display(),
        if key_manager.exists() { "present" } else { "missing" }
    );

    if !key_manager.exists() {
        println!(
            "credentials file: {} (not checked, no key yet)",
            config.paths.credentials_file.display()
        );
        return Ok(());
    }

    let console = Console::open(config).context("failed to open vault")?;
    match console.screen() {
        Screen::Onboarding => println!(
            "credentials file: {} (missing, run `vigil onboard`)",
            config.paths.credentials_file.display()
        ),
        Screen::Dashboard => match console.credentials() {
            Ok(credentials) => println!(
                "credentials file: {} (ok, notifications go to {})",
                config.paths.credentials_file.display(),
                credentials.receiver_email()
            ),
            Err(e) => println!(
                "credentials file: {} (unreadable: {e})",
                config.paths.credentials_file.display()
            ),
        },
    }
    Ok(())
}

/// Collect the sender password from stdin, then seal and persist.
fn handle_onboard(
    config: &VigilConfig,
    sender_email: String,
    receiver_email: String,
    force: bool,
) -> anyhow::Result<()> {
    let console = Console::open(config).context("failed to open vault")?;

    eprintln!("Enter sender password:");
    let mut line = Zeroizing::new(String::new());
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read sender password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();

    let credentials = Credentials::new(sender_email, password, receiver_email)?;
    console.onboard(credentials, force)?;
    println!(
        "Credentials saved to {}",
        console.vault().path().display()
    );
    Ok(())
}

/// Print the catalog as `name<TAB>artifact`.
fn handle_models() -> anyhow::Result<()> {
    let catalog = vigil::catalog::ModelCatalog::default();
    for entry in catalog.entries() {
        println!("{}\t{}", entry.name, entry.artifact_path);
    }
    Ok(())
}

/// Build the selection from `--model` toggles and dispatch.
fn handle_run(
    config: &VigilConfig,
    video: Option<PathBuf>,
    models: &[String],
    notify: bool,
) -> anyhow::Result<()> {
    let mut console = Console::open(config).context("failed to open vault")?;

    if console.screen() == Screen::Onboarding {
        anyhow::bail!(
            "no credentials stored at {}; run `vigil onboard` first",
            config.paths.credentials_file.display()
        );
    }

    for name in models {
        console
            .registry_mut()
            .apply(&SelectionCommand::Toggle(name.clone()))?;
    }

    let input = match video {
        Some(path) => InputSource::video(Some(path)),
        None => InputSource::Webcam,
    };

    match console.dispatch(&input, notify) {
        Ok(handle) => {
            info!(pid = handle.pid(), "dispatch complete");
            println!("Detection worker started (pid {})", handle.pid());
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, recoverable = e.is_recoverable(), "dispatch failed");
            Err(e.into())
        }
    }
}
