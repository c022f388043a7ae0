//! Provider/consumer protocol messages
//!
//! Every message is addressed to one provider instance. All of them are
//! handled, in arrival order, by the single service loop that owns the
//! tracking state.

use deltafeed_domain::{ConsumerId, Item, ProviderConfig, ProviderId, ProviderInstanceId};
use deltafeed_tracker::StatusSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;

/// Which announcement a consumer made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySignal {
    /// The consumer has just started and is ready for data
    ReadyForAction,
    /// The consumer asks for anything it has not yet received
    SendMoreData,
}

impl fmt::Display for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadySignal::ReadyForAction => write!(f, "READY_FOR_ACTION"),
            ReadySignal::SendMoreData => write!(f, "SEND_MORE_DATA"),
        }
    }
}

/// A request to the provider service
#[derive(Debug)]
pub enum ProviderMessage {
    /// Install a provider configuration
    Config {
        /// Target instance
        instance: ProviderInstanceId,
        /// Configuration to install
        config: ProviderConfig,
    },

    /// Clear tracking state, re-arming full redelivery
    Reset {
        /// Target instance
        instance: ProviderInstanceId,
    },

    /// Run one extraction and delivery cycle
    Update {
        /// Target instance
        instance: ProviderInstanceId,
        /// Provider id carried in the resulting pushes
        provider_id: ProviderId,
    },

    /// Report configuration and tracking state
    Status {
        /// Target instance
        instance: ProviderInstanceId,
        /// Receives the snapshot, or `None` when nothing is installed
        reply: oneshot::Sender<Option<StatusSnapshot>>,
    },

    /// A consumer announced readiness
    ConsumerReady {
        /// Target instance
        instance: ProviderInstanceId,
        /// Announcing consumer
        consumer: ConsumerId,
        /// Announcement kind
        signal: ReadySignal,
    },
}

impl ProviderMessage {
    /// Protocol name of the message
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderMessage::Config { .. } => "CONFIG",
            ProviderMessage::Reset { .. } => "RESET",
            ProviderMessage::Update { .. } => "UPDATE",
            ProviderMessage::Status { .. } => "STATUS",
            ProviderMessage::ConsumerReady { .. } => "CONSUMER_READY",
        }
    }

    /// Instance the message is addressed to
    pub fn instance(&self) -> &ProviderInstanceId {
        match self {
            ProviderMessage::Config { instance, .. }
            | ProviderMessage::Reset { instance }
            | ProviderMessage::Update { instance, .. }
            | ProviderMessage::Status { instance, .. }
            | ProviderMessage::ConsumerReady { instance, .. } => instance,
        }
    }
}

/// Source metadata attached to a push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Title of the feed whose batch triggered the push
    pub title: String,
}

/// Items pushed to one consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPush {
    /// Provider that produced the items
    pub provider_id: ProviderId,
    /// Recipient
    pub consumer_id: ConsumerId,
    /// Feed metadata
    pub source: SourceInfo,
    /// Items the consumer has not received before
    pub items: Vec<Item>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use deltafeed_domain::ItemValue;

    #[test]
    fn test_message_kinds() {
        let instance = ProviderInstanceId::new("m");
        let update = ProviderMessage::Update {
            instance: instance.clone(),
            provider_id: ProviderId::new("p"),
        };
        assert_eq!(update.kind(), "UPDATE");
        assert_eq!(update.instance(), &instance);
        assert_eq!(ProviderMessage::Reset { instance }.kind(), "RESET");
    }

    #[test]
    fn test_push_wire_format() {
        let push = DeliveryPush {
            provider_id: ProviderId::new("sensors"),
            consumer_id: ConsumerId::new("display"),
            source: SourceInfo {
                title: "CPU load".to_string(),
            },
            items: vec![Item::new(
                "cpu",
                "load",
                ItemValue::Numeric(42.5),
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            )],
        };

        let json = serde_json::to_value(&push).unwrap();
        assert_eq!(json["providerId"], "sensors");
        assert_eq!(json["consumerId"], "display");
        assert_eq!(json["source"]["title"], "CPU load");
        assert_eq!(json["items"][0]["subject"], "cpu");
        assert_eq!(json["items"][0]["value"], 42.5);
        assert_eq!(json["items"][0]["timestamp"], "2024-01-01T00:00:00Z");
    }
}
