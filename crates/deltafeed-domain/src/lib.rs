//! Deltafeed Domain Layer
//!
//! Value types shared by every other crate in the workspace. Nothing in here
//! performs I/O or holds mutable tracking state; the extractor, tracker,
//! queue and provider crates build their behaviour on top of these types.
//!
//! ## Key Concepts
//!
//! - **Item**: canonical subject/object/value/timestamp tuple produced by extraction
//! - **FieldMapping**: declarative description of how one JSON record becomes an Item
//! - **ProviderConfig**: one provider instance's feeds, consumers and timings
//! - **Record**: an ordered key/value view over one raw JSON record with
//!   explicit absent/null/present lookups
//! - **Identities**: provider instance, provider and consumer ids are distinct
//!   newtypes so they cannot be swapped by accident

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod identity;
pub mod item;
pub mod mapping;
pub mod record;

// Re-exports for convenience
pub use identity::{ConsumerId, ProviderId, ProviderInstanceId};
pub use item::{Item, ItemId, ItemValue};
pub use mapping::{FieldMapping, MinimumAge, ProviderConfig, TimestampSpec, ValueType};
pub use record::{Lookup, Record};
