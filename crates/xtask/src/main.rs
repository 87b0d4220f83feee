//! Development tasks for the combat workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;
mod logging;

use anyhow::Result;
use clap::Parser;
use commands::{Clean, InspectSnapshot, ListContent, Simulate};

/// Development tasks for the combat workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for grid combat", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run a scripted skirmish and print the transcript
    Simulate(Simulate),

    /// Read and inspect a saved snapshot
    InspectSnapshot(InspectSnapshot),

    /// List the abilities and item templates of a content directory
    ListContent(ListContent),

    /// Clean snapshots and logs
    Clean(Clean),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for COMBAT_SNAPSHOT_DIR and RUST_LOG)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(cmd) => {
            let _guard = logging::init("simulate")?;
            cmd.execute().await
        }
        Command::InspectSnapshot(cmd) => cmd.execute(),
        Command::ListContent(cmd) => cmd.execute(),
        Command::Clean(cmd) => cmd.execute(),
    }
}
