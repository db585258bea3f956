// Maker API response types
//
// The hub is loose about types: ids arrive as strings on some endpoints and
// numbers on others, attribute values may be strings, numbers or null, and
// `capabilities` mixes capability names with attribute descriptor objects.
// Models accept all of that and leave interpretation to callers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Id handling ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(i64),
    Text(String),
}

impl IdRepr {
    fn into_id<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid device id: {s:?}"))),
        }
    }
}

/// Deserialize an id sent either as `"12"` or `12`.
pub(crate) fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    IdRepr::deserialize(deserializer)?.into_id()
}

/// Optional variant of [`de_id`]; `null` and a missing field map to `None`.
pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<IdRepr>::deserialize(deserializer)?
        .map(IdRepr::into_id)
        .transpose()
}

/// Render a scalar attribute value the way the hub displays it.
///
/// Strings pass through, numbers and booleans are stringified, `null`
/// yields `None`. Arrays and objects are rendered as compact JSON.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Deserialize a scalar leniently through [`scalar_to_string`].
pub(crate) fn de_scalar<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

// ── Devices ──────────────────────────────────────────────────────────

/// A device as listed by `/devices` (brief) or `/devices/all` (full).
///
/// Brief listings carry only id, name and label; the remaining fields fall
/// back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerDevice {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    /// Capability names, interleaved with attribute descriptor objects.
    #[serde(default)]
    pub capabilities: Vec<Value>,
    /// Attribute name to current value.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Last activity, e.g. `2024-03-01T08:15:00+0000`.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub commands: Vec<Value>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MakerDevice {
    /// Capability names, skipping descriptor objects.
    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().filter_map(Value::as_str)
    }
}

/// One attribute in a `/devices/{id}` detail response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerAttribute {
    pub name: String,
    #[serde(default, rename = "currentValue")]
    pub current_value: Value,
    #[serde(default, rename = "dataType")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
}

/// Full detail of a single device from `/devices/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerDeviceDetail {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub attributes: Vec<MakerAttribute>,
    #[serde(default)]
    pub capabilities: Vec<Value>,
    #[serde(default)]
    pub commands: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MakerDeviceDetail {
    /// Capability names, skipping descriptor objects.
    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().filter_map(Value::as_str)
    }
}

// ── Device history & commands ────────────────────────────────────────

/// One entry of `/devices/{id}/events`, as the hub's event log records it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerDeviceEvent {
    /// Attribute key.
    pub name: String,
    #[serde(default, deserialize_with = "de_scalar")]
    pub value: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A command the device driver accepts, from `/devices/{id}/commands`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerCommand {
    pub command: String,
    #[serde(default, rename = "type")]
    pub arg_types: Vec<String>,
}

impl MakerCommand {
    /// Argument types, without the `n/a` the hub sends for none.
    pub fn argument_types(&self) -> impl Iterator<Item = &str> {
        self.arg_types
            .iter()
            .map(String::as_str)
            .filter(|t| *t != "n/a")
    }
}

// ── Modes & HSM ──────────────────────────────────────────────────────

/// A location mode from `/modes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerMode {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// Response of `/hsm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsmStatus {
    pub hsm: String,
}
