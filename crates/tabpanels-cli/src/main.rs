//! tabpanels CLI - tabbed panel rendering and reference indexing for notes
//!
//! This is the main entry point for the tabpanels command-line interface.
//! Command implementations live in separate modules under `commands/`.

use anyhow::Result;
use clap::Parser;
use tabpanels_core::Settings;
use tabpanels_core::snapshot::SnapshotStore;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;
mod commands;
mod hostfs;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match &cli.command {
        Commands::Render { file } => commands::render::execute(file, &settings),
        Commands::Refs { file } => commands::refs::execute(file, &settings),
        Commands::Rebuild { dir } => {
            let store = open_store(&cli)?;
            commands::rebuild::execute(dir, &settings, &store)
        },
        Commands::Show => {
            let store = open_store(&cli)?;
            commands::show::execute(&store)
        },
    }
}

fn open_store(cli: &Cli) -> Result<SnapshotStore> {
    let store = match &cli.data_dir {
        Some(dir) => SnapshotStore::with_root(dir.clone())?,
        None => SnapshotStore::new()?,
    };
    Ok(store)
}

fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
