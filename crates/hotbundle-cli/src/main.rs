mod config;
mod dispatch;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::dispatch::run_cli;

#[derive(Parser, Debug)]
#[command(name = "hotbundle")]
#[command(about = "Over-the-air content bundle updates", long_about = None)]
struct Cli {
    /// Config file; falls back to $HOTBUNDLE_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the metadata endpoint for the latest bundle.
    Check {
        #[arg(long)]
        url: Option<String>,
    },
    /// Download and install a bundle from a direct URL.
    Download { url: String },
    /// Check, then download the latest bundle.
    Update {
        #[arg(long)]
        url: Option<String>,
        /// Activate the downloaded version under the advertised name.
        #[arg(long)]
        activate: bool,
    },
    List,
    Activate { id: String, name: String },
    Delete { id: String, name: String },
    Reset,
    Current,
    Paths,
}

fn main() -> Result<()> {
    init_tracing();
    run_cli(Cli::parse())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
