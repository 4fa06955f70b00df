use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::filter::FilterSet;
use crate::pipeline::normalizer::OutputFormat;

/// Immutable view of the publishing configuration.
///
/// A new snapshot is built and validated in full on every load; readers
/// keep whichever one they grabbed until they drop it.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub enabled: bool,
    pub format: OutputFormat,
    pub filters: FilterSet,
    pub topic: String,
    pub connection: String,
}

impl ConfigSnapshot {
    pub fn from_config(config: &AppConfig, version: u64) -> Result<Self> {
        let mut filters = FilterSet::new();
        for line in &config.general.eventfilter {
            filters.add(line.criteria(), line.pattern())?;
        }

        Ok(Self {
            version,
            enabled: config.general.enabled,
            format: config.general.format,
            filters,
            topic: config.kafka.topic.clone(),
            connection: config.kafka.connection.clone(),
        })
    }
}
