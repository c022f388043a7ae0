//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::ExtractConfig;
use crate::error::Result;
use crate::output::Formatter;
use chrono::{DateTime, Utc};
use deltafeed_domain::{FieldMapping, Item};
use deltafeed_extractor::{extract_items, write_items};
use deltafeed_provider::{DocumentSource, LocatorSource};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info};

/// Items extracted for one feed.
#[derive(Debug, Clone)]
pub struct FeedOutput {
    /// Feed title
    pub title: String,
    /// Items that passed mapping
    pub items: Vec<Item>,
    /// Number of records rejected
    pub rejected: usize,
    /// File sink, if the feed has one
    pub sink: Option<PathBuf>,
}

/// Run each feed against its document.
///
/// Documents are fetched once per locator. A source defect on any feed aborts
/// the whole run.
pub async fn extract_feeds<S: DocumentSource>(
    config: &ExtractConfig,
    feeds: &[&FieldMapping],
    input: Option<&str>,
    source: &S,
    runtime: DateTime<Utc>,
) -> Result<Vec<FeedOutput>> {
    let mut documents: HashMap<String, Value> = HashMap::new();
    let mut outputs = Vec::with_capacity(feeds.len());

    for feed in feeds {
        let locator = config.input_for(feed, input)?;
        if !documents.contains_key(locator) {
            let document = source.fetch(locator).await?;
            documents.insert(locator.to_string(), document);
        }

        let result = extract_items(&documents[locator], feed, runtime).inspect_err(|e| {
            error!(source = %feed.title(), locator, error = %e, "Source defect");
        })?;

        info!(
            source = %feed.title(),
            admitted = result.items.len(),
            rejected = result.failures.len(),
            "Feed extracted"
        );

        outputs.push(FeedOutput {
            title: feed.title().to_string(),
            rejected: result.failures.len(),
            items: result.items,
            sink: feed.output_sink.clone(),
        });
    }

    Ok(outputs)
}

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, formatter: &Formatter) -> Result<()> {
    let config = ExtractConfig::load(&args.config)?;
    let feeds = config.select(args.feed.as_deref())?;
    let source = LocatorSource::new()?;

    let outputs = extract_feeds(&config, &feeds, args.input.as_deref(), &source, Utc::now()).await?;

    let mut console = Vec::new();
    for output in outputs {
        if output.rejected > 0 {
            eprintln!(
                "{}",
                formatter.warning(&format!(
                    "{}: {} record(s) rejected",
                    output.title, output.rejected
                ))
            );
        }

        match &output.sink {
            Some(path) => {
                write_items(path, &output.items)?;
                eprintln!(
                    "{}",
                    formatter.success(&format!(
                        "{}: wrote {} item(s) to {}",
                        output.title,
                        output.items.len(),
                        path.display()
                    ))
                );
            }
            None => console.extend(output.items),
        }
    }

    if feeds.iter().any(|f| f.output_sink.is_none()) {
        println!("{}", formatter.format_items(&console)?);
    }
    Ok(())
}
