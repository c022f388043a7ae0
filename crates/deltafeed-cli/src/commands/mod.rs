//! Command implementations.

pub mod extract;
pub mod feeds;

pub use self::extract::{execute_extract, extract_feeds, FeedOutput};
pub use self::feeds::execute_feeds;
