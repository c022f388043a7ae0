//! Tracking store keyed by provider instance
//!
//! Every provider instance owns its own sources and delivery tracker; two
//! instances extracting the same feed never share a high-water-mark.

use crate::delivery::{ConsumerBatch, DeliverySnapshot, DeliveryTracker};
use crate::error::TrackerError;
use crate::freshness::{FilterOutcome, FreshnessFilter, TrackedSource};
use deltafeed_domain::{ConsumerId, Item, ProviderConfig, ProviderInstanceId};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Tracking state of one provider instance
#[derive(Debug, Clone)]
pub struct ProviderState {
    config: ProviderConfig,
    sources: Vec<TrackedSource>,
    tracker: DeliveryTracker,
}

impl ProviderState {
    fn new(config: ProviderConfig) -> Self {
        let sources = seed_sources(&config);
        Self {
            config,
            sources,
            tracker: DeliveryTracker::new(),
        }
    }

    /// Installed configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// One tracked source per configured feed, in feed order
    pub fn sources(&self) -> &[TrackedSource] {
        &self.sources
    }

    /// Delivery tracker
    pub fn tracker(&self) -> &DeliveryTracker {
        &self.tracker
    }

    /// Register a consumer with the delivery tracker
    pub fn register_consumer(&mut self, consumer: ConsumerId) -> bool {
        self.tracker.register_consumer(consumer)
    }

    /// Filter a source's candidates and start tracking the admitted ones
    ///
    /// The admitted items are returned for the file sink.
    pub fn ingest(&mut self, source: usize, candidates: Vec<Item>) -> Result<FilterOutcome, TrackerError> {
        let count = self.sources.len();
        let tracked = self
            .sources
            .get_mut(source)
            .ok_or(TrackerError::UnknownSource { index: source, count })?;

        let outcome = FreshnessFilter::filter(tracked, candidates);
        for item in &outcome.admitted {
            self.tracker.admit(item.clone());
        }
        Ok(outcome)
    }

    /// Build the batches owed to each consumer and purge fully delivered items
    pub fn deliver(&mut self) -> Vec<ConsumerBatch> {
        let batches = self.tracker.build_batches();
        self.tracker.purge_delivered();
        batches
    }

    /// Clear tracked items and re-seed every source
    pub fn reset(&mut self) {
        self.tracker.clear_items();
        for source in &mut self.sources {
            source.reset();
        }
    }

    /// Snapshot for diagnostics
    pub fn snapshot(&self, instance: &ProviderInstanceId) -> StatusSnapshot {
        StatusSnapshot {
            instance: instance.clone(),
            config: self.config.clone(),
            sources: self.sources.clone(),
            delivery: self.tracker.snapshot(),
        }
    }
}

fn seed_sources(config: &ProviderConfig) -> Vec<TrackedSource> {
    config
        .feeds
        .iter()
        .map(|feed| TrackedSource::new(feed.title(), &feed.minimum_age))
        .collect()
}

/// Configuration and tracking state of one provider instance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Provider instance
    pub instance: ProviderInstanceId,
    /// Installed configuration
    pub config: ProviderConfig,
    /// Per-source freshness state
    pub sources: Vec<TrackedSource>,
    /// Consumers and tracked items
    #[serde(flatten)]
    pub delivery: DeliverySnapshot,
}

impl StatusSnapshot {
    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String, TrackerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Explicit store of provider tracking state, keyed by instance
#[derive(Debug, Default)]
pub struct TrackingStore {
    states: HashMap<ProviderInstanceId, ProviderState>,
}

impl TrackingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the configuration of `instance`
    ///
    /// Sources are seeded from their minimum age. When replacing, consumers
    /// still on the new allow-list stay registered.
    pub fn install(&mut self, instance: ProviderInstanceId, config: ProviderConfig) -> Result<(), TrackerError> {
        config.validate().map_err(TrackerError::InvalidConfig)?;

        let mut state = ProviderState::new(config);
        if let Some(previous) = self.states.remove(&instance) {
            for consumer in previous.tracker.consumers() {
                if state.config.serves(consumer) {
                    state.tracker.register_consumer(consumer.clone());
                }
            }
            info!(instance = %instance, "Replaced provider configuration");
        } else {
            info!(
                instance = %instance,
                provider = %state.config.id,
                feeds = state.config.feeds.len(),
                "Installed provider configuration"
            );
        }

        self.states.insert(instance, state);
        Ok(())
    }

    /// Clear tracking state of `instance`, re-arming full redelivery
    pub fn reset(&mut self, instance: &ProviderInstanceId) -> Result<(), TrackerError> {
        let state = self
            .states
            .get_mut(instance)
            .ok_or_else(|| TrackerError::UnknownInstance(instance.clone()))?;
        state.reset();
        info!(instance = %instance, "Tracking state reset");
        Ok(())
    }

    /// State of `instance`, if configured
    pub fn state(&self, instance: &ProviderInstanceId) -> Option<&ProviderState> {
        self.states.get(instance)
    }

    /// Mutable state of `instance`, if configured
    pub fn state_mut(&mut self, instance: &ProviderInstanceId) -> Option<&mut ProviderState> {
        self.states.get_mut(instance)
    }

    /// Drop all state of `instance`
    pub fn remove(&mut self, instance: &ProviderInstanceId) -> Option<ProviderState> {
        self.states.remove(instance)
    }

    /// Number of configured instances
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no instance is configured
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltafeed_domain::FieldMapping;

    fn config() -> ProviderConfig {
        let mut config = ProviderConfig::new("sensors");
        config.input = Some("data.json".to_string());
        config.consumer_ids = vec![ConsumerId::new("A"), ConsumerId::new("B")];
        config.feeds.push(FieldMapping::new("name", "load", "val"));
        config
    }

    #[test]
    fn test_install_seeds_sources() {
        let mut store = TrackingStore::new();
        let instance = ProviderInstanceId::new("module_1");
        store.install(instance.clone(), config()).unwrap();

        let state = store.state(&instance).unwrap();
        assert_eq!(state.sources().len(), 1);
        assert!(state.tracker().consumers().is_empty());
    }

    #[test]
    fn test_install_rejects_invalid_config() {
        let mut store = TrackingStore::new();
        let mut bad = config();
        bad.poll_interval_ms = 0;
        let result = store.install(ProviderInstanceId::new("m"), bad);
        assert!(matches!(result, Err(TrackerError::InvalidConfig(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reinstall_keeps_allowed_consumers() {
        let mut store = TrackingStore::new();
        let instance = ProviderInstanceId::new("m");
        store.install(instance.clone(), config()).unwrap();
        let state = store.state_mut(&instance).unwrap();
        state.register_consumer(ConsumerId::new("A"));
        state.register_consumer(ConsumerId::new("B"));

        let mut narrowed = config();
        narrowed.consumer_ids = vec![ConsumerId::new("B")];
        store.install(instance.clone(), narrowed).unwrap();

        let consumers = store.state(&instance).unwrap().tracker().consumers().to_vec();
        assert_eq!(consumers, vec![ConsumerId::new("B")]);
    }

    #[test]
    fn test_reset_unknown_instance() {
        let mut store = TrackingStore::new();
        let result = store.reset(&ProviderInstanceId::new("nope"));
        assert!(matches!(result, Err(TrackerError::UnknownInstance(_))));
    }

    #[test]
    fn test_ingest_unknown_source() {
        let mut store = TrackingStore::new();
        let instance = ProviderInstanceId::new("m");
        store.install(instance.clone(), config()).unwrap();

        let result = store.state_mut(&instance).unwrap().ingest(3, Vec::new());
        assert!(matches!(result, Err(TrackerError::UnknownSource { index: 3, count: 1 })));
    }

    #[test]
    fn test_remove() {
        let mut store = TrackingStore::new();
        let instance = ProviderInstanceId::new("m");
        store.install(instance.clone(), config()).unwrap();
        assert!(store.remove(&instance).is_some());
        assert!(store.state(&instance).is_none());
    }
}
