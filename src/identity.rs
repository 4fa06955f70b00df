//! System identification injected into every published event.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::SystemConfig;
use crate::error::{AppError, Result};

/// Six-byte node identifier, rendered as `xx:xx:xx:xx:xx:xx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId([u8; 6]);

impl EntityId {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// Picks the hardware address of the first usable network interface,
    /// falling back to an id derived from the host name.
    pub fn detect() -> Self {
        Self::from_interfaces(Path::new("/sys/class/net")).unwrap_or_else(|| {
            let host = hostname();
            tracing::debug!("No usable interface address, deriving entity id from host '{}'", host);
            Self::from_hostname(&host)
        })
    }

    fn from_interfaces(root: &Path) -> Option<Self> {
        let mut names: Vec<_> = std::fs::read_dir(root)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .filter(|name| name != "lo")
            .collect();
        names.sort();

        names.into_iter().find_map(|name| {
            let address = std::fs::read_to_string(root.join(&name).join("address")).ok()?;
            let id = address.trim().parse::<EntityId>().ok()?;
            (id.0 != [0; 6]).then_some(id)
        })
    }

    /// Stable id from a host name, with the locally administered bit set.
    pub fn from_hostname(host: &str) -> Self {
        let digest = Sha256::digest(host.as_bytes());
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(&digest[..6]);
        bytes[0] = (bytes[0] | 0x02) & !0x01;
        Self(bytes)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl FromStr for EntityId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AppError::Identity(format!("'{}' is not of the form xx:xx:xx:xx:xx:xx", s));

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (byte, part) in bytes.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(invalid());
            }
            let decoded = hex::decode(part).map_err(|_| invalid())?;
            *byte = decoded[0];
        }

        Ok(Self(bytes))
    }
}

/// Read-only identity shared by every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    pub entity_id: EntityId,
    pub system_name: Option<String>,
}

impl SystemIdentity {
    pub fn new(entity_id: EntityId, system_name: Option<String>) -> Self {
        Self {
            entity_id,
            system_name: system_name.filter(|name| !name.is_empty()),
        }
    }

    pub fn from_config(config: &SystemConfig) -> Result<Self> {
        let entity_id = match config.entity_id.as_deref() {
            Some(configured) => configured.parse()?,
            None => EntityId::detect(),
        };

        Ok(Self::new(entity_id, config.name.clone()))
    }

    pub fn system_name(&self) -> Option<&str> {
        self.system_name.as_deref()
    }
}

fn hostname() -> String {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
}
