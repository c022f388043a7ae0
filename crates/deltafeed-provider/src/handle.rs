//! Client handle for the provider service

use crate::error::ProviderError;
use crate::protocol::{ProviderMessage, ReadySignal};
use deltafeed_domain::{ConsumerId, ProviderConfig, ProviderId, ProviderInstanceId};
use deltafeed_tracker::StatusSnapshot;
use tokio::sync::{mpsc, oneshot};

/// Cloneable sender of protocol messages
///
/// Every method only enqueues a message; its effects happen on the service
/// loop in the order messages were sent.
#[derive(Debug, Clone)]
pub struct ProviderHandle {
    tx: mpsc::Sender<ProviderMessage>,
}

impl ProviderHandle {
    pub(crate) fn new(tx: mpsc::Sender<ProviderMessage>) -> Self {
        Self { tx }
    }

    /// Send `CONFIG`
    pub async fn config(&self, instance: ProviderInstanceId, config: ProviderConfig) -> Result<(), ProviderError> {
        self.send(ProviderMessage::Config { instance, config }).await
    }

    /// Send `RESET`
    pub async fn reset(&self, instance: ProviderInstanceId) -> Result<(), ProviderError> {
        self.send(ProviderMessage::Reset { instance }).await
    }

    /// Send `UPDATE`
    pub async fn update(&self, instance: ProviderInstanceId, provider_id: ProviderId) -> Result<(), ProviderError> {
        self.send(ProviderMessage::Update { instance, provider_id }).await
    }

    /// Send `STATUS` and wait for the snapshot
    ///
    /// `None` means no configuration is installed for `instance`.
    pub async fn status(&self, instance: ProviderInstanceId) -> Result<Option<StatusSnapshot>, ProviderError> {
        let (reply, rx) = oneshot::channel();
        self.send(ProviderMessage::Status { instance, reply }).await?;
        rx.await.map_err(|_| ProviderError::ServiceStopped)
    }

    /// Announce that `consumer` is ready
    pub async fn consumer_ready(
        &self,
        instance: ProviderInstanceId,
        consumer: ConsumerId,
        signal: ReadySignal,
    ) -> Result<(), ProviderError> {
        self.send(ProviderMessage::ConsumerReady {
            instance,
            consumer,
            signal,
        })
        .await
    }

    async fn send(&self, message: ProviderMessage) -> Result<(), ProviderError> {
        self.tx.send(message).await.map_err(|_| ProviderError::ServiceStopped)
    }
}
