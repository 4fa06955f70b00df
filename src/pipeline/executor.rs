use arc_swap::ArcSwapOption;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::config::{AppConfig, ConnectionConfig};
use crate::error::Result;
use crate::identity::SystemIdentity;
use crate::pipeline::event::RawEvent;
use crate::pipeline::normalizer::EventNormalizer;
use crate::pipeline::producer::{Producer, ProducerFactory};
use crate::pipeline::snapshot::ConfigSnapshot;

/// What happened to one event. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Disabled,
    Filtered,
    NoTopic,
    NoProducer,
    RenderFailed,
    Sent,
    SendFailed,
}

struct CachedProducer {
    name: String,
    connection: ConnectionConfig,
    producer: Arc<dyn Producer>,
}

/// Decides, renders and publishes AMI events.
///
/// `handle` runs on the event source's thread and never blocks on reload:
/// the configuration and the producer are each behind an atomic pointer
/// swap, and a reader keeps the snapshot it loaded until it returns.
pub struct PublishPipeline {
    snapshot: ArcSwapOption<ConfigSnapshot>,
    producer: ArcSwapOption<CachedProducer>,
    normalizer: EventNormalizer,
    factory: Arc<dyn ProducerFactory>,
    versions: AtomicU64,
    /// Serializes reloads. Never taken by `handle`.
    reload_lock: Mutex<()>,
}

impl PublishPipeline {
    pub fn new(identity: Arc<SystemIdentity>, factory: Arc<dyn ProducerFactory>) -> Self {
        Self {
            snapshot: ArcSwapOption::empty(),
            producer: ArcSwapOption::empty(),
            normalizer: EventNormalizer::new(identity),
            factory,
            versions: AtomicU64::new(0),
            reload_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Option<Arc<ConfigSnapshot>> {
        self.snapshot.load_full()
    }

    pub fn has_producer(&self) -> bool {
        self.producer.load().is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot().map_or(false, |snapshot| snapshot.enabled) && self.has_producer()
    }

    /// Hot path, called once per event.
    pub fn handle(&self, event: &RawEvent<'_>) -> Outcome {
        let Some(snapshot) = self.snapshot.load_full() else {
            return Outcome::Disabled;
        };
        if !snapshot.enabled {
            return Outcome::Disabled;
        }

        if !snapshot.filters.decide(event) {
            trace!("Event {} filtered out", event.name);
            return Outcome::Filtered;
        }

        if snapshot.topic.is_empty() {
            return Outcome::NoTopic;
        }

        let Some(cached) = self.producer.load_full() else {
            trace!("No producer provisioned, dropping event {}", event.name);
            return Outcome::NoProducer;
        };

        let payload = match self.normalizer.render(snapshot.format, event.name, event.body) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Dropping event {}: {}", event.name, e);
                return Outcome::RenderFailed;
            }
        };

        match cached.producer.send(&snapshot.topic, event.name, &payload) {
            Ok(()) => {
                trace!(
                    "Published event {} (category={}, {} bytes) to {}",
                    event.name,
                    event.category,
                    payload.len(),
                    snapshot.topic
                );
                Outcome::Sent
            }
            Err(e) => {
                warn!("Failed to publish event {} to {}: {}", event.name, snapshot.topic, e);
                Outcome::SendFailed
            }
        }
    }

    /// Builds a snapshot from `config` and swaps it in.
    ///
    /// On error the active snapshot is left untouched. Producer
    /// provisioning failures are logged and keep the previous producer.
    /// Concurrent reloads run one at a time, so the last one to finish
    /// also carries the highest version.
    pub fn reload(&self, config: &AppConfig) -> Result<()> {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let version = self.versions.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = ConfigSnapshot::from_config(config, version)?;

        info!(
            "Loaded configuration v{} (enabled={}, format={}, {} include / {} exclude filters, topic={})",
            snapshot.version,
            snapshot.enabled,
            snapshot.format,
            snapshot.filters.includes().len(),
            snapshot.filters.excludes().len(),
            snapshot.topic
        );
        if !snapshot.enabled {
            info!("AMI Kafka publishing is disabled");
        }

        self.snapshot.store(Some(Arc::new(snapshot)));
        self.provision_producer(config);

        Ok(())
    }

    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let result = AppConfig::from_file(path).and_then(|config| self.reload(&config));

        if let Err(e) = &result {
            error!(
                "Failed to reload {}: {}; keeping previous configuration",
                path.display(),
                e
            );
        }
        result
    }

    fn provision_producer(&self, config: &AppConfig) {
        let Some((name, connection)) = config.selected_connection() else {
            if config.kafka.connection.is_empty() {
                warn!("No Kafka connection configured");
            } else {
                warn!("Kafka connection '{}' is not defined", config.kafka.connection);
            }
            return;
        };

        if let Some(current) = self.producer.load_full() {
            if current.name == name && current.connection == *connection {
                debug!("Kafka connection '{}' unchanged, keeping producer", name);
                return;
            }
        }

        match self.factory.create(name, connection) {
            Ok(producer) => {
                self.producer.store(Some(Arc::new(CachedProducer {
                    name: name.to_string(),
                    connection: connection.clone(),
                    producer,
                })));
            }
            Err(e) => error!("Failed to get Kafka producer for connection '{}': {}", name, e),
        }
    }

    /// Waits for queued messages to reach the broker.
    pub fn flush(&self, timeout: Duration) {
        if let Some(cached) = self.producer.load_full() {
            if let Err(e) = cached.producer.flush(timeout) {
                warn!("{}", e);
            }
        }
    }
}
