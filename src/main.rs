//! Spaces bridge CLI entry point.
//!
//! Diagnostic subcommands for inspecting how Spaces records are presented
//! to the chat application: `avatar`, `translate`, and `check-config`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use spaces_bridge::commands::{Command as BusCommand, UpdateMessagesArgs};
use spaces_bridge::config::{config_dir, load_config, BridgeConfig};
use spaces_bridge::host::SpaceMessages;
use spaces_bridge::logging;
use spaces_bridge::spaces::activation::ActivationSchedule;
use spaces_bridge::spaces::avatar::gravatar_url;
use spaces_bridge::spaces::translate::to_channel_messages;

/// Spaces bridge — Live Share Spaces as a chat provider.
#[derive(Parser)]
#[command(name = "spaces-bridge", version, about)]
struct Cli {
    /// Config file (default: ~/.spaces-bridge/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSON logs to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Print the avatar URL for an email address.
    Avatar {
        /// User email.
        email: String,
    },
    /// Translate a message-received payload (`{name, messages}` JSON) into
    /// the update-messages command.
    Translate {
        /// Path to the JSON payload.
        file: PathBuf,
    },
    /// Load the config and print the effective settings.
    CheckConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logging_guard = logging::init(cli.log_dir.as_deref())?;
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Avatar { email } => {
            println!("{}", gravatar_url(&email, &config.avatar));
            Ok(())
        }
        Command::Translate { file } => handle_translate(&file, &config),
        Command::CheckConfig => handle_check_config(&config),
    }
}

/// Explicit paths must exist; a missing default file means defaults.
fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<BridgeConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let path = config_dir()?.join("config.toml");
    if path.exists() {
        load_config(&path)
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        Ok(BridgeConfig::default())
    }
}

fn handle_translate(file: &Path, config: &BridgeConfig) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let data: SpaceMessages = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    let received = data.messages.len();
    let messages = to_channel_messages(&data.messages);
    info!(
        space = %data.name,
        received,
        translated = messages.len(),
        "translated message batch"
    );

    let command = BusCommand::UpdateMessages(UpdateMessagesArgs {
        channel_id: data.name,
        messages,
        provider: config.provider.clone(),
    });
    let out = serde_json::json!({
        "command": command.name(),
        "args": command.payload().context("failed to serialize command")?,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&out).context("failed to render output")?
    );
    Ok(())
}

fn handle_check_config(config: &BridgeConfig) -> anyhow::Result<()> {
    let schedule = ActivationSchedule::from_config(&config.activation);
    println!("provider: {}", config.provider);
    println!("extension: {}", config.extension.id);
    println!("startup delay: {:?}", config.extension.startup_delay());
    println!(
        "activation: {:?}, {} wait(s), {:?} total",
        config.activation.strategy,
        schedule.waits().len(),
        schedule.total()
    );
    println!(
        "avatar: size={} d={} secure={}",
        config.avatar.size, config.avatar.default_style, config.avatar.secure
    );
    Ok(())
}
