//! Deltafeed CLI - standalone extraction from JSON documents.

use clap::Parser;
use deltafeed_cli::commands;
use deltafeed_cli::{Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> deltafeed_cli::Result<()> {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format.into(), !cli.no_color);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &formatter).await,
        Command::Feeds(args) => commands::execute_feeds(args, &formatter),
    }
}
