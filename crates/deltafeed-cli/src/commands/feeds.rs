//! Feeds command implementation.

use crate::cli::FeedsArgs;
use crate::config::ExtractConfig;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the feeds command.
pub fn execute_feeds(args: FeedsArgs, formatter: &Formatter) -> Result<()> {
    let config = ExtractConfig::load(&args.config)?;
    println!("{}", formatter.format_feeds(&config.feeds)?);
    Ok(())
}
