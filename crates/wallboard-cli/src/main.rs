//! Wallboard CLI entry point

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use wallboard_cli::{cli::Cli, commands::CommandDispatcher, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = CommandDispatcher::execute(cli).await {
        error!("command failed: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

/// Honor RUST_LOG when set, otherwise fall back on the verbosity flag.
fn setup_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
