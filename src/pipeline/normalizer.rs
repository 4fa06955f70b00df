use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::identity::SystemIdentity;

pub const EVENT_FIELD: &str = "Event";
pub const ENTITY_ID_FIELD: &str = "EntityID";
pub const SYSTEM_NAME_FIELD: &str = "SystemName";

/// Payload format published to the topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    /// Body lines parsed into a flat JSON object.
    #[default]
    Json,
    /// Manager text as received, with identification headers prepended.
    RawText,
}

impl TryFrom<String> for OutputFormat {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "ami" | "raw" => Ok(Self::RawText),
            _ => Err(AppError::Config(format!(
                "Invalid format '{}', must be 'json' or 'ami'",
                value
            ))),
        }
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::RawText => f.write_str("ami"),
        }
    }
}

/// Turns AMI events into publishable payloads.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    identity: Arc<SystemIdentity>,
}

impl EventNormalizer {
    pub fn new(identity: Arc<SystemIdentity>) -> Self {
        Self { identity }
    }

    pub fn render(&self, format: OutputFormat, name: &str, body: &str) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Json => {
                let document = self.to_structured(name, body);
                serde_json::to_vec(&document)
                    .map_err(|e| AppError::Render(format!("Failed to encode event {}: {}", name, e)))
            }
            OutputFormat::RawText => Ok(self.to_raw_text(name, body)),
        }
    }

    /// Builds the JSON document for an event.
    ///
    /// Only lines containing `": "` become fields; anything else is
    /// skipped. Fields keep their insertion order, and a repeated key
    /// overwrites the value in place.
    pub fn to_structured(&self, name: &str, body: &str) -> Map<String, Value> {
        let mut document = Map::new();

        document.insert(EVENT_FIELD.to_string(), Value::String(name.to_string()));
        document.insert(
            ENTITY_ID_FIELD.to_string(),
            Value::String(self.identity.entity_id.to_string()),
        );
        if let Some(system_name) = self.identity.system_name() {
            document.insert(
                SYSTEM_NAME_FIELD.to_string(),
                Value::String(system_name.to_string()),
            );
        }

        for line in body.split(['\r', '\n']).filter(|line| !line.is_empty()) {
            if let Some((key, value)) = line.split_once(": ") {
                document.insert(key.to_string(), Value::String(value.to_string()));
            }
        }

        document
    }

    /// Prepends identification headers to the untouched body.
    pub fn to_raw_text(&self, name: &str, body: &str) -> Vec<u8> {
        let mut text = String::with_capacity(body.len() + 128);

        let has_event_line = body
            .split(['\r', '\n'])
            .any(|line| line.starts_with("Event:"));
        if !has_event_line {
            text.push_str(&format!("{}: {}\r\n", EVENT_FIELD, name));
        }

        text.push_str(&format!("{}: {}\r\n", ENTITY_ID_FIELD, self.identity.entity_id));
        if let Some(system_name) = self.identity.system_name() {
            text.push_str(&format!("{}: {}\r\n", SYSTEM_NAME_FIELD, system_name));
        }
        text.push_str(body);

        text.into_bytes()
    }
}
