// ── Attribute change events ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::DeviceId;

/// A single attribute transition pushed by the hub.
///
/// Location events (`mode`, `hsmStatus`) carry no meaningful device id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub device_id: Option<DeviceId>,
    /// The hub's display name for the device.
    pub alias: Option<String>,
    pub key: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// An event stamped with the current time.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            device_id: None,
            alias: None,
            key: key.into(),
            value: value.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn for_device(mut self, id: DeviceId) -> Self {
        self.device_id = Some(id);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
