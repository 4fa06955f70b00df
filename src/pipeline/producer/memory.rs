use std::sync::{Arc, Mutex};

use super::{Producer, ProducerFactory};
use crate::config::ConnectionConfig;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

impl Record {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or_default()
    }
}

/// Producer that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryProducer {
    records: Mutex<Vec<Record>>,
    fail: bool,
}

impl MemoryProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A producer whose sends always fail.
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl Producer for MemoryProducer {
    fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()> {
        if self.fail {
            return Err(AppError::Producer("queue full".to_string()));
        }

        let mut records = self
            .records
            .lock()
            .map_err(|_| AppError::Producer("record buffer poisoned".to_string()))?;
        records.push(Record {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

/// Hands out one shared [`MemoryProducer`] and remembers which
/// connections were requested.
#[derive(Debug, Default)]
pub struct MemoryProducerFactory {
    producer: Arc<MemoryProducer>,
    created: Mutex<Vec<String>>,
}

impl MemoryProducerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn producer(&self) -> Arc<MemoryProducer> {
        Arc::clone(&self.producer)
    }

    pub fn created(&self) -> Vec<String> {
        self.created
            .lock()
            .map(|created| created.clone())
            .unwrap_or_default()
    }
}

impl ProducerFactory for MemoryProducerFactory {
    fn create(&self, name: &str, connection: &ConnectionConfig) -> Result<Arc<dyn Producer>> {
        // resolve secrets the same way a real client would
        connection.client_properties(name)?;

        if let Ok(mut created) = self.created.lock() {
            created.push(name.to_string());
        }
        Ok(self.producer())
    }
}
