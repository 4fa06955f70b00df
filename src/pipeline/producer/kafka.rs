use rdkafka::config::ClientConfig;
use rdkafka::producer::{BaseRecord, DefaultProducerContext, Producer as _, ThreadedProducer};
use std::sync::Arc;
use std::time::Duration;

use super::{Producer, ProducerFactory};
use crate::config::ConnectionConfig;
use crate::error::{AppError, Result};

/// rdkafka producer with its own polling thread. `send` only enqueues into
/// librdkafka's buffer.
pub struct KafkaProducer {
    name: String,
    inner: ThreadedProducer<DefaultProducerContext>,
}

impl KafkaProducer {
    pub fn new(name: &str, connection: &ConnectionConfig) -> Result<Self> {
        let mut client = ClientConfig::new();
        for (key, value) in connection.client_properties(name)? {
            client.set(key, value);
        }

        let inner = client
            .create::<ThreadedProducer<DefaultProducerContext>>()
            .map_err(|e| {
                AppError::Producer(format!(
                    "Failed to create Kafka producer for connection '{}': {}",
                    name, e
                ))
            })?;

        tracing::info!(
            connection = %name,
            brokers = %connection.brokers,
            "Created Kafka producer"
        );

        Ok(Self {
            name: name.to_string(),
            inner,
        })
    }
}

impl Producer for KafkaProducer {
    fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()> {
        let record = BaseRecord::to(topic).key(key).payload(payload);

        self.inner
            .send(record)
            .map_err(|(e, _)| AppError::Producer(format!("{}: {}", self.name, e)))
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.inner
            .flush(timeout)
            .map_err(|e| AppError::Producer(format!("{}: flush failed: {}", self.name, e)))
    }
}

pub struct KafkaProducerFactory;

impl ProducerFactory for KafkaProducerFactory {
    fn create(&self, name: &str, connection: &ConnectionConfig) -> Result<Arc<dyn Producer>> {
        Ok(Arc::new(KafkaProducer::new(name, connection)?))
    }
}
