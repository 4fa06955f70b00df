pub mod secret;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::pipeline::normalizer::OutputFormat;
use secret::SecretSource;

pub const DEFAULT_CONFIG_PATH: &str = "config/ami_kafka.json";
pub const DEFAULT_TOPIC: &str = "asterisk_ami";
pub const ENV_PREFIX: &str = "AMI_KAFKA";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub eventfilter: Vec<FilterLine>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            format: OutputFormat::default(),
            eventfilter: Vec::new(),
        }
    }
}

/// One `eventfilter` entry: a bare legacy pattern or a criteria/pattern pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterLine {
    Legacy(String),
    Rule {
        criteria: String,
        #[serde(default)]
        pattern: String,
    },
}

impl FilterLine {
    pub fn criteria(&self) -> &str {
        match self {
            FilterLine::Legacy(_) => "eventfilter",
            FilterLine::Rule { criteria, .. } => criteria,
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            FilterLine::Legacy(pattern) => pattern,
            FilterLine::Rule { pattern, .. } => pattern,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KafkaConfig {
    #[serde(default)]
    pub connection: String,
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            connection: String::new(),
            topic: default_topic(),
        }
    }
}

/// Producer connection settings, referenced by name from `kafka.connection`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionConfig {
    pub brokers: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub security_protocol: Option<String>,
    #[serde(default)]
    pub sasl: Option<SaslConfig>,
    /// Passed verbatim to the Kafka client.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SaslConfig {
    #[serde(default = "default_sasl_mechanism")]
    pub mechanism: String,
    pub username: String,
    pub password: SecretSource,
}

impl ConnectionConfig {
    /// Client properties for this connection, with secrets resolved.
    pub fn client_properties(&self, name: &str) -> Result<Vec<(String, String)>> {
        let mut settings = vec![
            ("bootstrap.servers".to_string(), self.brokers.clone()),
            (
                "client.id".to_string(),
                self.client_id
                    .clone()
                    .unwrap_or_else(|| format!("ami-kafka-{}", name)),
            ),
        ];

        if let Some(protocol) = &self.security_protocol {
            settings.push(("security.protocol".to_string(), protocol.clone()));
        }

        if let Some(sasl) = &self.sasl {
            settings.push(("sasl.mechanism".to_string(), sasl.mechanism.clone()));
            settings.push(("sasl.username".to_string(), sasl.username.clone()));
            settings.push(("sasl.password".to_string(), sasl.password.resolve()?));
        }

        settings.extend(
            self.properties
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_events_path")]
    pub events_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: None,
            events_path: default_events_path(),
        }
    }
}

impl ServerConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(AppConfig::get_port)
    }
}

impl AppConfig {
    /// Reads the file, then applies `AMI_KAFKA__SECTION__KEY` overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::Config(format!(
                "configuration file {} not found",
                path.display()
            )));
        }

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn config_path() -> String {
        std::env::var("CONFIGURATION_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    pub fn get_port() -> u16 {
        std::env::var("HTTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000)
    }

    /// Looks up the connection named by `kafka.connection`.
    pub fn selected_connection(&self) -> Option<(&str, &ConnectionConfig)> {
        let wanted = self.kafka.connection.as_str();
        if wanted.is_empty() {
            return None;
        }

        // keys may come back lowercased from the config loader
        self.connections
            .get_key_value(wanted)
            .or_else(|| {
                self.connections
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            })
            .map(|(name, connection)| (name.as_str(), connection))
    }
}

fn default_enabled() -> bool {
    true
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

fn default_events_path() -> String {
    "/ami/events".to_string()
}

fn default_sasl_mechanism() -> String {
    "SCRAM-SHA-256".to_string()
}
