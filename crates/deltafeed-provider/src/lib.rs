//! Deltafeed Provider
//!
//! The provider side of the provider/consumer protocol: installs
//! configurations, runs extraction cycles on a paced single-lane queue, and
//! pushes each consumer only the items it has not received yet.
//!
//! # Protocol
//!
//! | Message | Effect |
//! |---------|--------|
//! | `CONFIG` | install a provider configuration and seed its sources |
//! | `RESET` | clear tracked items and re-seed sources; consumers stay registered |
//! | `UPDATE` | run one extraction and delivery cycle; ignored before `CONFIG` |
//! | `STATUS` | log and return configuration plus tracking state |
//! | consumer ready | register (or reset) the consumer, run `UPDATE`, start the poll timer |
//!
//! # Example
//!
//! ```no_run
//! use deltafeed_domain::{ConsumerId, ProviderConfig, ProviderInstanceId};
//! use deltafeed_provider::{LocatorSource, ProviderService, ReadySignal};
//!
//! # async fn example(config: ProviderConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let (service, handle, mut pushes) = ProviderService::new(LocatorSource::new()?);
//! tokio::spawn(service.run());
//!
//! let instance = ProviderInstanceId::new("module_1");
//! handle.config(instance.clone(), config).await?;
//! handle
//!     .consumer_ready(instance, ConsumerId::new("display"), ReadySignal::ReadyForAction)
//!     .await?;
//!
//! while let Some(push) = pushes.recv().await {
//!     println!("{} items for {}", push.items.len(), push.consumer_id);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
mod error;
mod handle;
pub mod protocol;
mod service;
pub mod source;

pub use error::ProviderError;
pub use handle::ProviderHandle;
pub use protocol::{DeliveryPush, ProviderMessage, ReadySignal, SourceInfo};
pub use service::ProviderService;
pub use source::{DocumentSource, LocatorSource, SourceError};
