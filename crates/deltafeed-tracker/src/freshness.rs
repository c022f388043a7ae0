//! Freshness filter: per-source high-water-mark
//!
//! An item is admitted only when its timestamp is strictly after the source's
//! high-water-mark. Admitted timestamps raise `latest_seen`; the mark itself
//! only moves once the whole batch has been seen, and only forward.

use chrono::{DateTime, Local, Utc};
use deltafeed_domain::{Item, MinimumAge};
use serde::Serialize;
use tracing::{debug, warn};

/// Freshness state for one configured feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSource {
    title: String,
    high_water_mark: DateTime<Utc>,
    latest_seen: DateTime<Utc>,
    #[serde(skip)]
    minimum_age: MinimumAge,
}

impl TrackedSource {
    /// Create a source seeded from `minimum_age` relative to the current time
    pub fn new(title: impl Into<String>, minimum_age: &MinimumAge) -> Self {
        Self::seeded(title, minimum_age, Local::now())
    }

    /// Create a source seeded from `minimum_age` relative to `now`
    ///
    /// A minimum age that cannot be resolved is logged and seeds the mark
    /// at `now`.
    pub fn seeded(title: impl Into<String>, minimum_age: &MinimumAge, now: DateTime<Local>) -> Self {
        let title = title.into();
        let mark = seed_mark(&title, minimum_age, now);
        Self {
            title,
            high_water_mark: mark,
            latest_seen: mark,
            minimum_age: minimum_age.clone(),
        }
    }

    /// Title of the feed this source tracks
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Items at or before this point are considered already seen
    pub fn high_water_mark(&self) -> DateTime<Utc> {
        self.high_water_mark
    }

    /// Latest admitted timestamp in the current batch
    pub fn latest_seen(&self) -> DateTime<Utc> {
        self.latest_seen
    }

    /// Decide whether `item` is new, recording its timestamp if so
    pub fn admit(&mut self, item: &Item) -> bool {
        if item.timestamp <= self.high_water_mark {
            debug!(
                source = %self.title,
                subject = %item.subject,
                timestamp = %item.timestamp,
                "Stale item"
            );
            return false;
        }
        if item.timestamp > self.latest_seen {
            self.latest_seen = item.timestamp;
        }
        true
    }

    /// Close the current batch, advancing the mark to the latest admitted timestamp
    pub fn finish_batch(&mut self) {
        if self.latest_seen > self.high_water_mark {
            self.high_water_mark = self.latest_seen;
        }
    }

    /// Re-seed from the configured minimum age, re-arming full redelivery
    pub fn reset(&mut self) {
        self.reset_at(Local::now());
    }

    /// Re-seed relative to `now`
    pub fn reset_at(&mut self, now: DateTime<Local>) {
        let mark = seed_mark(&self.title, &self.minimum_age, now);
        self.high_water_mark = mark;
        self.latest_seen = mark;
    }
}

fn seed_mark(title: &str, minimum_age: &MinimumAge, now: DateTime<Local>) -> DateTime<Utc> {
    match minimum_age.resolve(now) {
        Ok(mark) => mark,
        Err(label) => {
            warn!(source = %title, minimum_age = %label, "Invalid minimum age, using current time");
            now.with_timezone(&Utc)
        }
    }
}

/// Outcome of filtering one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    /// Items strictly newer than the mark, in batch order
    pub admitted: Vec<Item>,
    /// Number of items rejected as stale
    pub stale: usize,
}

/// Applies a [`TrackedSource`] to a full batch of candidates
pub struct FreshnessFilter;

impl FreshnessFilter {
    /// Filter `candidates` against `source` and close the batch
    pub fn filter(source: &mut TrackedSource, candidates: Vec<Item>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for item in candidates {
            if source.admit(&item) {
                outcome.admitted.push(item);
            } else {
                outcome.stale += 1;
            }
        }
        source.finish_batch();
        outcome
    }
}
