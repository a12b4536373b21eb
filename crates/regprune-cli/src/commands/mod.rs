//! CLI commands and argument parsing.

pub mod prune;

use clap::{Parser, Subcommand};

/// regprune - Retention policy cleanup for container registry tags
#[derive(Parser)]
#[command(name = "regprune")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Delete tags that fall outside the retention policy
    Prune(prune::PruneArgs),

    /// Print version information
    Version,
}
