//! CLI structure and argument parsing.
//!
//! The CLI follows a command-subcommand pattern: global options for logging
//! and data location, then one subcommand per operation. It acts as a plain
//! filesystem host for the core library, treating a notes directory as the
//! document set.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for the `tabpanels` command.
#[derive(Debug, Parser)]
#[command(
    name = "tabpanels",
    about = "Tabbed panel rendering and reference indexing for markdown notes",
    version
)]
pub struct Cli {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Data directory for the snapshot (defaults to the platform data dir,
    /// `TABPANELS_DATA_DIR` overrides)
    #[arg(long, global = true, value_name = "DIR", env = "TABPANELS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Settings file to load instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render the tab blocks of one document as panel trees
    Render {
        /// Markdown file to render
        file: PathBuf,
    },

    /// Extract structural references from one document and print them as
    /// JSON
    Refs {
        /// Markdown file to scan
        file: PathBuf,
    },

    /// Walk a notes directory, rebuild the index and rewrite the snapshot
    Rebuild {
        /// Notes directory (document paths are keyed relative to it)
        dir: PathBuf,
    },

    /// Print the current snapshot as JSON
    Show,
}
