//! Provider service loop
//!
//! One task owns the [`TrackingStore`] and handles protocol messages and
//! fetch results strictly one at a time. Fetching and mapping run on each
//! instance's [`ProcessingQueue`]; only their results come back here, so
//! tracking state is never touched from anywhere else.

use crate::handle::ProviderHandle;
use crate::protocol::{DeliveryPush, ProviderMessage, ReadySignal, SourceInfo};
use crate::source::DocumentSource;
use chrono::{DateTime, Utc};
use deltafeed_domain::{ConsumerId, FieldMapping, Item, ProviderConfig, ProviderId, ProviderInstanceId};
use deltafeed_extractor::{extract_items, write_items, ExtractionResult};
use deltafeed_queue::{ProcessingQueue, QueueConfig, TaskReport};
use deltafeed_tracker::TrackingStore;
use futures::FutureExt;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const INBOX_CAPACITY: usize = 64;

/// Result of one feed task
#[derive(Debug)]
struct FeedBatch {
    feed_index: usize,
    provider_id: ProviderId,
    result: ExtractionResult,
}

/// A finished queue task, tagged with its instance and the configuration
/// generation its queue was created for
struct FeedEvent {
    instance: ProviderInstanceId,
    generation: u64,
    report: TaskReport<FeedBatch>,
}

/// One file-sink write, performed off the service loop
struct SinkWrite {
    path: PathBuf,
    source: String,
    items: Vec<Item>,
}

/// Per-instance runtime pieces that are not tracking state
struct InstanceRuntime {
    queue: ProcessingQueue<FeedBatch>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    outstanding: usize,
    cycle_started: Option<Instant>,
}

impl Drop for InstanceRuntime {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// The provider side of the protocol
pub struct ProviderService<S> {
    store: TrackingStore,
    source: Arc<S>,
    runtime: DateTime<Utc>,
    inbox: mpsc::Receiver<ProviderMessage>,
    loopback: mpsc::WeakSender<ProviderMessage>,
    events_tx: mpsc::UnboundedSender<FeedEvent>,
    events_rx: mpsc::UnboundedReceiver<FeedEvent>,
    outbox: mpsc::UnboundedSender<DeliveryPush>,
    sinks_tx: mpsc::UnboundedSender<SinkWrite>,
    sinks_rx: Option<mpsc::UnboundedReceiver<SinkWrite>>,
    instances: HashMap<ProviderInstanceId, InstanceRuntime>,
    generations: u64,
}

impl<S: DocumentSource> ProviderService<S> {
    /// Create a service reading documents from `source`
    ///
    /// Returns the service, a handle for sending it messages, and the
    /// receiver delivery pushes arrive on. The service runs until every
    /// handle has been dropped.
    pub fn new(source: S) -> (Self, ProviderHandle, mpsc::UnboundedReceiver<DeliveryPush>) {
        Self::with_runtime(source, Utc::now())
    }

    /// Create a service whose offset timestamps are relative to `runtime`
    pub fn with_runtime(
        source: S,
        runtime: DateTime<Utc>,
    ) -> (Self, ProviderHandle, mpsc::UnboundedReceiver<DeliveryPush>) {
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbox, pushes) = mpsc::unbounded_channel();
        let (sinks_tx, sinks_rx) = mpsc::unbounded_channel();

        let service = Self {
            store: TrackingStore::new(),
            source: Arc::new(source),
            runtime,
            inbox,
            loopback: tx.downgrade(),
            events_tx,
            events_rx,
            outbox,
            sinks_tx,
            sinks_rx: Some(sinks_rx),
            instances: HashMap::new(),
            generations: 0,
        };
        (service, ProviderHandle::new(tx), pushes)
    }

    /// Handle messages and task results until every handle is dropped
    pub async fn run(mut self) {
        info!(runtime = %self.runtime, "Provider service started");
        if let Some(sinks) = self.sinks_rx.take() {
            tokio::spawn(write_sinks(sinks));
        }

        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }

        self.instances.clear();
        info!("Provider service stopped");
    }

    fn handle_message(&mut self, message: ProviderMessage) {
        debug!(kind = message.kind(), instance = %message.instance(), "Message received");

        match message {
            ProviderMessage::Config { instance, config } => self.install(instance, config),
            ProviderMessage::Reset { instance } => {
                if let Err(e) = self.store.reset(&instance) {
                    debug!(instance = %instance, "RESET ignored: {}", e);
                }
            }
            ProviderMessage::Update { instance, provider_id } => self.update(&instance, provider_id),
            ProviderMessage::Status { instance, reply } => {
                let snapshot = self.store.state(&instance).map(|state| state.snapshot(&instance));
                match snapshot.as_ref().map(|s| s.to_json()) {
                    Some(Ok(json)) => info!(instance = %instance, "Status:\n{}", json),
                    Some(Err(e)) => warn!(instance = %instance, "Status could not be rendered: {}", e),
                    None => info!(instance = %instance, "Status: no configuration installed"),
                }
                let _ = reply.send(snapshot);
            }
            ProviderMessage::ConsumerReady { instance, consumer, signal } => {
                self.consumer_ready(instance, consumer, signal)
            }
        }
    }

    fn install(&mut self, instance: ProviderInstanceId, config: ProviderConfig) {
        let pacing = QueueConfig::with_pacing_ms(config.queue_pacing_ms);
        if let Err(e) = self.store.install(instance.clone(), config) {
            error!(instance = %instance, "CONFIG rejected: {}", e);
            return;
        }

        // Results of tasks queued under a previous configuration are dropped.
        // Dropping the previous runtime also aborts its poll timer.
        self.generations += 1;
        let queue = self.spawn_queue(instance.clone(), self.generations, pacing);
        self.instances.remove(&instance);
        self.instances.insert(
            instance.clone(),
            InstanceRuntime {
                queue,
                generation: self.generations,
                timer: None,
                outstanding: 0,
                cycle_started: None,
            },
        );

        // Consumers carried over keep being polled, on the new interval
        let Some(state) = self.store.state(&instance) else {
            return;
        };
        if !state.tracker().consumers().is_empty() {
            let provider_id = state.config().id.clone();
            let poll = state.config().poll_interval();
            self.ensure_timer(&instance, provider_id, poll);
        }
    }

    fn spawn_queue(
        &self,
        instance: ProviderInstanceId,
        generation: u64,
        config: QueueConfig,
    ) -> ProcessingQueue<FeedBatch> {
        let (queue, mut reports) = ProcessingQueue::new(config);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(report) = reports.recv().await {
                let event = FeedEvent {
                    instance: instance.clone(),
                    generation,
                    report,
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        });
        queue
    }

    fn update(&mut self, instance: &ProviderInstanceId, provider_id: ProviderId) {
        let Some(state) = self.store.state(instance) else {
            debug!(instance = %instance, "UPDATE before CONFIG ignored");
            return;
        };
        let Some(runtime) = self.instances.get_mut(instance) else {
            return;
        };

        let config = state.config();
        for (feed_index, feed) in config.feeds.iter().enumerate() {
            let Some(locator) = config.input_for(feed_index) else {
                warn!(instance = %instance, source = feed.title(), "No input locator");
                continue;
            };
            enqueue_feed(
                &runtime.queue,
                FeedTask {
                    source: Arc::clone(&self.source),
                    locator: locator.to_string(),
                    mapping: feed.clone(),
                    runtime: self.runtime,
                    feed_index,
                    provider_id: provider_id.clone(),
                },
            );
            runtime.outstanding += 1;
        }

        if runtime.cycle_started.is_none() {
            runtime.cycle_started = Some(Instant::now());
        }
        runtime.queue.start();
    }

    fn consumer_ready(&mut self, instance: ProviderInstanceId, consumer: ConsumerId, signal: ReadySignal) {
        let Some(state) = self.store.state_mut(&instance) else {
            debug!(instance = %instance, consumer = %consumer, "Readiness before CONFIG ignored");
            return;
        };
        if !state.config().serves(&consumer) {
            debug!(instance = %instance, consumer = %consumer, "Readiness from unknown consumer ignored");
            return;
        }

        let provider_id = state.config().id.clone();
        let poll = state.config().poll_interval();
        let joined = state.register_consumer(consumer.clone());
        info!(
            instance = %instance,
            consumer = %consumer,
            %signal,
            rejoined = !joined,
            "Consumer ready"
        );

        self.update(&instance, provider_id.clone());
        self.ensure_timer(&instance, provider_id, poll);
    }

    fn ensure_timer(&mut self, instance: &ProviderInstanceId, provider_id: ProviderId, poll: Duration) {
        let Some(runtime) = self.instances.get_mut(instance) else {
            return;
        };
        if runtime.timer.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        debug!(instance = %instance, ?poll, "Poll timer started");
        let loopback = self.loopback.clone();
        let instance = instance.clone();
        runtime.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll);
            // The first tick fires immediately; readiness already triggered an update
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(tx) = loopback.upgrade() else { break };
                let message = ProviderMessage::Update {
                    instance: instance.clone(),
                    provider_id: provider_id.clone(),
                };
                if tx.send(message).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn handle_event(&mut self, event: FeedEvent) {
        let FeedEvent {
            instance,
            generation,
            report,
        } = event;
        let Some(runtime) = self.instances.get_mut(&instance) else {
            return;
        };
        if runtime.generation != generation {
            debug!(instance = %instance, task = %report.label, "Result from replaced configuration dropped");
            return;
        }

        runtime.outstanding = runtime.outstanding.saturating_sub(1);
        let finished = if runtime.outstanding == 0 {
            runtime.cycle_started.take()
        } else {
            None
        };

        match report.outcome {
            Ok(batch) => self.apply_batch(&instance, batch),
            Err(e) => {
                error!(instance = %instance, task = %report.label, "Source skipped this cycle: {}", e)
            }
        }

        if let Some(started) = finished {
            info!(instance = %instance, elapsed = ?started.elapsed(), "Cycle complete");
        }
    }

    fn apply_batch(&mut self, instance: &ProviderInstanceId, batch: FeedBatch) {
        let Some(state) = self.store.state_mut(instance) else {
            return;
        };
        let Some(mapping) = state.config().feeds.get(batch.feed_index).cloned() else {
            return;
        };

        let rejected = batch.result.rejected();
        let outcome = match state.ingest(batch.feed_index, batch.result.items) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(instance = %instance, "{}", e);
                return;
            }
        };

        info!(
            instance = %instance,
            source = mapping.title(),
            admitted = outcome.admitted.len(),
            stale = outcome.stale,
            rejected,
            "Source processed"
        );

        if let Some(path) = &mapping.output_sink {
            let write = SinkWrite {
                path: path.clone(),
                source: mapping.title().to_string(),
                items: outcome.admitted.clone(),
            };
            if self.sinks_tx.send(write).is_err() {
                warn!(instance = %instance, source = mapping.title(), "Sink writer stopped");
            }
        }

        for owed in state.deliver() {
            let push = DeliveryPush {
                provider_id: batch.provider_id.clone(),
                consumer_id: owed.consumer_id,
                source: SourceInfo {
                    title: mapping.title().to_string(),
                },
                items: owed.items,
            };
            info!(
                instance = %instance,
                consumer = %push.consumer_id,
                items = push.items.len(),
                "Delivering"
            );
            if self.outbox.send(push).is_err() {
                debug!("Push receiver closed");
            }
        }
    }
}

struct FeedTask<S> {
    source: Arc<S>,
    locator: String,
    mapping: FieldMapping,
    runtime: DateTime<Utc>,
    feed_index: usize,
    provider_id: ProviderId,
}

fn enqueue_feed<S: DocumentSource>(queue: &ProcessingQueue<FeedBatch>, task: FeedTask<S>) {
    let label = format!("{}#{}", task.mapping.title(), task.feed_index);
    queue.enqueue(label, move |done| {
        async move {
            let document = match task.source.fetch(&task.locator).await {
                Ok(document) => document,
                Err(e) => return done.fail(e.to_string()),
            };
            match extract_items(&document, &task.mapping, task.runtime) {
                Ok(result) => done.succeed(FeedBatch {
                    feed_index: task.feed_index,
                    provider_id: task.provider_id,
                    result,
                }),
                Err(e) => done.fail(e.to_string()),
            }
        }
        .boxed()
    });
}

/// Write sink files one at a time, in the order the cycles produced them
async fn write_sinks(mut sinks: mpsc::UnboundedReceiver<SinkWrite>) {
    while let Some(write) = sinks.recv().await {
        let SinkWrite { path, source, items } = write;
        let result = tokio::task::spawn_blocking(move || write_items(&path, &items)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(source = %source, "File sink failed: {}", e),
            Err(e) => error!(source = %source, "File sink task failed: {}", e),
        }
    }
}
