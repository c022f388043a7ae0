//! Deltafeed Tracking Layer
//!
//! Remembers what has been seen and what has been sent, per provider instance.
//!
//! # Architecture
//!
//! - [`TrackedSource`] holds one feed's high-water-mark; the
//!   [`FreshnessFilter`] admits only items strictly newer than it and advances
//!   the mark once a whole batch has been seen
//! - [`DeliveryTracker`] fans admitted items out to registered consumers and
//!   purges them once every consumer has its copy
//! - [`TrackingStore`] owns both, keyed by [`ProviderInstanceId`]
//!
//! State lives in memory only; a restart or an explicit reset re-arms full
//! redelivery.
//!
//! # Examples
//!
//! ```
//! use deltafeed_domain::{ConsumerId, FieldMapping, ProviderConfig, ProviderInstanceId};
//! use deltafeed_tracker::TrackingStore;
//!
//! let mut config = ProviderConfig::new("sensors");
//! config.input = Some("sensors.json".to_string());
//! config.feeds.push(FieldMapping::new("name", "load", "val"));
//!
//! let mut store = TrackingStore::new();
//! let instance = ProviderInstanceId::new("module_1");
//! store.install(instance.clone(), config).unwrap();
//!
//! let state = store.state_mut(&instance).unwrap();
//! state.register_consumer(ConsumerId::new("display"));
//! assert!(state.deliver().is_empty());
//! ```
//!
//! [`ProviderInstanceId`]: deltafeed_domain::ProviderInstanceId

#![warn(missing_docs)]

mod delivery;
mod error;
mod freshness;
mod store;

pub use delivery::{ConsumerBatch, DeliverySnapshot, DeliveryTracker, TrackedItem};
pub use error::TrackerError;
pub use freshness::{FilterOutcome, FreshnessFilter, TrackedSource};
pub use store::{ProviderState, StatusSnapshot, TrackingStore};
