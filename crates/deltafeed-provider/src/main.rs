//! Deltafeed Provider CLI
//!
//! Installs the configured providers, announces the console consumers as
//! ready, and prints every delivery push as one JSON line on stdout.

use deltafeed_provider::config::ProviderSettings;
use deltafeed_provider::{LocatorSource, ProviderError, ProviderService, ReadySignal};
use std::env;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ProviderError> {
    let args: Vec<String> = env::args().collect();

    let settings = if args.len() > 2 && args[1] == "--config" {
        ProviderSettings::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Usage: deltafeed-provider --config <path-to-provider.toml>");
        process::exit(2);
    };

    let (service, handle, mut pushes) = ProviderService::new(LocatorSource::new()?);
    let service = tokio::spawn(service.run());

    for entry in &settings.providers {
        let instance = entry.instance_id();
        handle.config(instance.clone(), entry.config.clone()).await?;
        handle.status(instance.clone()).await?;

        for consumer in &settings.console_consumers {
            handle
                .consumer_ready(instance.clone(), consumer.clone(), ReadySignal::ReadyForAction)
                .await?;
        }
    }

    info!(
        providers = settings.providers.len(),
        consumers = settings.console_consumers.len(),
        "Provider running"
    );

    loop {
        tokio::select! {
            push = pushes.recv() => match push {
                Some(push) => match serde_json::to_string(&push) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("Error: failed to render push: {}", e),
                },
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping provider");
                break;
            }
        }
    }

    drop(handle);
    let _ = service.await;
    Ok(())
}

fn print_help() {
    println!("Deltafeed Provider - incremental JSON extraction and delivery");
    println!();
    println!("USAGE:");
    println!("    deltafeed-provider --config <path-to-provider.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - console_consumers: consumers announced at startup; their pushes go to stdout");
    println!("    - [[providers]]: one table per provider instance (id, input, consumer_ids,");
    println!("      poll_interval_ms, queue_pacing_ms) with [[providers.feeds]] field mappings");
    println!();
    println!("LOGGING:");
    println!("    Set RUST_LOG (default: info). Logs are written to stderr.");
    println!();
}
