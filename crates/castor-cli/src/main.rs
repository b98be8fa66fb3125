//! Castor CLI - headless front end for the playback session controller
//!
//! Features:
//! - Dry-run session loads against an in-memory engine
//! - Load target composition for separate audio sources
//! - Engine error explanations
//! - Progress bar computation for live and VOD timelines
//! - Preset and key system listings

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// Castor CLI - playback session toolkit
#[derive(Parser)]
#[command(name = "castor")]
#[command(author = "Castor Contributors")]
#[command(version)]
#[command(about = "Playback session controller toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: String,

    /// Controller configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Session request fields
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Manifest URL
    #[arg(short, long)]
    manifest: Option<String>,

    /// Separate audio playlist URL
    #[arg(short, long)]
    audio: Option<String>,

    /// ClearKey key id (hex)
    #[arg(long)]
    key_id: Option<String>,

    /// ClearKey key (hex)
    #[arg(long)]
    key: Option<String>,

    /// Start playback after loading
    #[arg(long)]
    autoplay: bool,

    /// Start from a preset (example, shaka, clear)
    #[arg(short, long)]
    preset: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a session against the recording engine and show what it received
    Plan {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Print the effective load target
    Compose {
        /// Primary manifest URL
        #[arg(short, long)]
        manifest: String,

        /// Separate audio playlist URL
        #[arg(short, long)]
        audio: Option<String>,

        /// Also print the decoded inline playlist
        #[arg(short, long)]
        decode: bool,
    },

    /// Explain an engine error code
    Explain {
        /// Engine error code
        #[arg(long)]
        code: u32,

        /// Engine error category
        #[arg(long, default_value = "0")]
        category: u32,

        /// Engine-provided message
        #[arg(long, default_value = "Engine error")]
        message: String,
    },

    /// Compute the seek bar for a timeline position
    Progress {
        /// Current playback time in seconds
        #[arg(short, long)]
        time: f64,

        /// VOD duration in seconds
        #[arg(short, long)]
        duration: Option<f64>,

        /// Live seek range start
        #[arg(long, requires = "end")]
        start: Option<f64>,

        /// Live seek range end
        #[arg(long, requires = "start")]
        end: Option<f64>,

        /// End of the buffered range in seconds
        #[arg(short, long)]
        buffered: Option<f64>,
    },

    /// List stream presets
    Presets,

    /// List known DRM key systems
    KeySystems,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    castor_core::init();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan { request } => {
            commands::plan(request, config, &cli.format).await?;
        }
        Commands::Compose { manifest, audio, decode } => {
            commands::compose(&manifest, audio.as_deref(), decode, &cli.format)?;
        }
        Commands::Explain { code, category, message } => {
            commands::explain(code, category, &message, &cli.format)?;
        }
        Commands::Progress { time, duration, start, end, buffered } => {
            let timeline = commands::Timeline::from_args(duration, start.zip(end))?;
            commands::progress(time, timeline, buffered, &config, &cli.format)?;
        }
        Commands::Presets => {
            commands::presets(&cli.format)?;
        }
        Commands::KeySystems => {
            commands::key_systems(&cli.format)?;
        }
    }

    Ok(())
}
