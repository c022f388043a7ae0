//! CLI command definitions and argument parsing.

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deltafeed - extract subject/object/value items from JSON documents.
#[derive(Debug, Parser)]
#[command(name = "deltafeed")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format for console output
    #[arg(short, long, value_enum, global = true, default_value = "json")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Pretty JSON array (default)
    Json,
    /// Table format
    Table,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Table => OutputFormat::Table,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract items from a document using a mapping file
    Extract(ExtractArgs),

    /// List the feeds defined in a mapping file
    Feeds(FeedsArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Mapping file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Input locator (file path or http(s) URL), overriding the mapping file
    #[arg(short, long)]
    pub input: Option<String>,

    /// Only run the feed with this name or title
    #[arg(long)]
    pub feed: Option<String>,
}

/// Arguments for the feeds command.
#[derive(Debug, Parser)]
pub struct FeedsArgs {
    /// Mapping file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    pub config: PathBuf,
}
