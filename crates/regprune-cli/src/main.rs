//! regprune CLI - Removes container image tags according to a retention policy.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "regprune=debug,regprune_core=debug,regprune_registry=debug"
    } else {
        "regprune=info,regprune_core=info,regprune_registry=warn"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Prune(args) => commands::prune::execute(args).await,
        Commands::Version => {
            println!("regprune {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
