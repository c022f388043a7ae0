//! Deltafeed CLI library.
//!
//! Standalone extraction: load a mapping file, read one input document and
//! either print the extracted items or write them to each feed's file sink.
//! A missing or empty root-key array is fatal here, unlike in the provider
//! where the source is only skipped for the cycle.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::{ExtractConfig, OutputFormat};
pub use error::{CliError, Result};
pub use output::Formatter;
