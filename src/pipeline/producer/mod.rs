#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use crate::config::ConnectionConfig;
use crate::error::{AppError, Result};

/// Message bus client. `send` must hand the payload off without waiting
/// for the broker.
pub trait Producer: Send + Sync {
    fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()>;

    fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

/// Provisions producers for named connections at load time.
pub trait ProducerFactory: Send + Sync {
    fn create(&self, name: &str, connection: &ConnectionConfig) -> Result<Arc<dyn Producer>>;
}

/// Factory used when the crate is built without a Kafka client.
pub struct UnavailableProducerFactory;

impl ProducerFactory for UnavailableProducerFactory {
    fn create(&self, name: &str, _connection: &ConnectionConfig) -> Result<Arc<dyn Producer>> {
        Err(AppError::Producer(format!(
            "cannot create producer for connection '{}': built without the kafka feature",
            name
        )))
    }
}

pub fn default_factory() -> Arc<dyn ProducerFactory> {
    #[cfg(feature = "kafka")]
    {
        Arc::new(kafka::KafkaProducerFactory)
    }
    #[cfg(not(feature = "kafka"))]
    {
        Arc::new(UnavailableProducerFactory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_factory_refuses() {
        let connection = ConnectionConfig {
            brokers: "localhost:9092".to_string(),
            client_id: None,
            security_protocol: None,
            sasl: None,
            properties: Default::default(),
        };

        let err = UnavailableProducerFactory
            .create("main", &connection)
            .err()
            .unwrap();
        assert!(err.to_string().contains("'main'"));
    }
}
