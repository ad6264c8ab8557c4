//! MagicQ CLI - encode, check and fire MagicQ OSC cues from the command line
//!
//! Useful for checking that a console answers before a show, and for
//! inspecting exactly what a cue puts on the wire.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use magicq_core::Operation;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod settings;

use settings::{FileConfig, Overrides};

/// MagicQ - fire ChamSys MagicQ remote playback commands over OSC
#[derive(Parser)]
#[command(name = "magicq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML with an [osc] table)
    #[arg(short, long, global = true, env = "MAGICQ_CONFIG")]
    config: Option<PathBuf>,

    /// OSC port, used for both the local bind and the console
    #[arg(short, long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Console IP address
    #[arg(short = 'H', long, global = true)]
    host: Option<IpAddr>,

    /// Pad addresses to the OSC 4-byte boundary
    #[arg(long, global = true)]
    strict_padding: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Pulse interval in milliseconds
    #[arg(long, global = true, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pulse_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the address and datagram for one operation
    Encode {
        /// Operation (activate, release, go, stop, level, jump)
        operation: Operation,

        /// Playback number
        #[arg(short = 'n', long)]
        playback: i16,

        /// Fader level for the level operation
        #[arg(long, default_value = "0")]
        level: i16,

        /// Cue id for the jump operation
        #[arg(long, default_value = "")]
        cue: String,
    },

    /// Check a saved cue and print its error, if any
    Check {
        /// Saved cue (JSON)
        file: PathBuf,
    },

    /// Change one field of a saved cue
    Set {
        /// Saved cue (JSON), rewritten in place
        file: PathBuf,

        /// Field key (playback, level, jump_cue_id, action_go, ...)
        field: String,

        /// New value (number, cue id, or true/false/on/off)
        value: String,
    },

    /// Build a cue from flags and fire it
    Fire(FireArgs),

    /// Fire a saved cue
    Run {
        /// Saved cue (JSON)
        file: PathBuf,

        /// Pre-wait before firing, in milliseconds
        #[arg(long, default_value = "0")]
        pre_wait_ms: u64,
    },
}

/// Cue built from the command line
#[derive(Args, Debug, Clone, PartialEq)]
pub struct FireArgs {
    /// Playback number (1-10)
    #[arg(short = 'n', long)]
    pub playback: i16,

    /// Activate the playback
    #[arg(long)]
    pub activate: bool,

    /// Set the fader to this level (0-100)
    #[arg(long)]
    pub level: Option<i16>,

    /// Go on the playback
    #[arg(long)]
    pub go: bool,

    /// Jump to this cue id
    #[arg(long)]
    pub jump: Option<String>,

    /// Stop the playback
    #[arg(long)]
    pub stop: bool,

    /// Release the playback
    #[arg(long)]
    pub release: bool,

    /// Pre-wait before firing, in milliseconds
    #[arg(long, default_value = "0")]
    pub pre_wait_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.log_level, cli.json_logs)?;

    let file = match &cli.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let overrides = Overrides {
        port: cli.port,
        host: cli.host,
        strict_padding: cli.strict_padding,
    };
    let settings = settings::resolve(file, &overrides);
    let pulse = std::time::Duration::from_millis(cli.pulse_ms);

    // Handle Ctrl+C
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(()).await;
        }
    });

    match cli.command {
        Commands::Encode {
            operation,
            playback,
            level,
            cue,
        } => {
            commands::encode(operation, playback, level, &cue, settings.padding)?;
        }

        Commands::Check { file } => {
            let json = read_cue_file(&file)?;
            commands::check(&json, settings)?;
        }

        Commands::Set { file, field, value } => {
            let json = read_cue_file(&file)?;
            let updated = commands::set(&json, &field, &value, settings)?;
            std::fs::write(&file, updated)
                .with_context(|| format!("Failed to write {}", file.display()))?;
        }

        Commands::Fire(args) => {
            commands::fire(&args, settings, pulse, &mut shutdown_rx).await?;
        }

        Commands::Run { file, pre_wait_ms } => {
            let json = read_cue_file(&file)?;
            commands::run(&json, pre_wait_ms, settings, pulse, &mut shutdown_rx).await?;
        }
    }

    Ok(())
}

fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to parse log level")?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).compact())
            .init();
    }

    Ok(())
}

fn read_cue_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
