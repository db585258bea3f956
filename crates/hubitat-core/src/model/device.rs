// ── Device domain types ──

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::capability::Capability;

/// Hub-assigned device id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for DeviceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Which device field names a device for lookups.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AliasKey {
    /// The user-assigned label, falling back to the driver name when unset.
    #[default]
    Label,
    Name,
}

/// A device with its capabilities and current attribute values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub label: Option<String>,
    pub room: Option<String>,
    pub device_type: Option<String>,
    pub capabilities: Vec<Capability>,
    /// Attribute key to current value, rendered as strings.
    pub attributes: BTreeMap<String, String>,
    /// When the hub last recorded activity for the device.
    pub last_activity: Option<DateTime<Utc>>,
}

impl Device {
    pub fn alias(&self, key: AliasKey) -> &str {
        match key {
            AliasKey::Label => self.label.as_deref().unwrap_or(&self.name),
            AliasKey::Name => &self.name,
        }
    }

    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }
}
