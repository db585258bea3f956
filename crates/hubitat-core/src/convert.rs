// ── API-to-domain type conversions ──
//
// Bridges raw `hubitat_api` wire types into `hubitat_core::model` types.
// Wire quirks are absorbed here: descriptor objects inside `capabilities`,
// the `dataType`/`values` noise keys in `attributes`, numeric attribute
// values and string-or-number ids.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use hubitat_api::{HsmStatus, MakerDevice, MakerDeviceDetail, MakerEvent, MakerMode, scalar_to_string};

use crate::error::CoreError;
use crate::model::{Capability, Device, DeviceId, Event, Mode, SecurityState};

/// Attribute keys that describe an attribute rather than hold a value.
pub const IGNORED_ATTRIBUTE_KEYS: [&str; 2] = ["dataType", "values"];

/// Format of the `date` field on `/devices/all` entries.
const DEVICE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

// ── Helpers ────────────────────────────────────────────────────────

/// Parse a device `date`, dropping values the hub sent in another shape.
pub fn parse_device_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, DEVICE_DATE_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn capabilities<'a>(names: impl Iterator<Item = &'a str>) -> Vec<Capability> {
    let mut out: Vec<Capability> = Vec::new();
    for capability in names.map(Capability::from) {
        if !out.contains(&capability) {
            out.push(capability);
        }
    }
    out
}

// ── Device ─────────────────────────────────────────────────────────

impl From<MakerDevice> for Device {
    fn from(raw: MakerDevice) -> Self {
        let capabilities = capabilities(raw.capability_names());
        let attributes = raw
            .attributes
            .iter()
            .filter(|(key, _)| !IGNORED_ATTRIBUTE_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key.clone(), v)))
            .collect();

        Device {
            id: DeviceId(raw.id),
            name: raw.name,
            label: raw.label,
            room: raw.room,
            device_type: raw.device_type,
            capabilities,
            attributes,
            last_activity: raw.date.as_deref().and_then(parse_device_date),
        }
    }
}

impl From<MakerDeviceDetail> for Device {
    fn from(raw: MakerDeviceDetail) -> Self {
        let capabilities = capabilities(raw.capability_names());
        let attributes: BTreeMap<String, String> = raw
            .attributes
            .iter()
            .filter_map(|attr| scalar_to_string(&attr.current_value).map(|v| (attr.name.clone(), v)))
            .collect();

        Device {
            id: DeviceId(raw.id),
            name: raw.name,
            label: raw.label,
            room: raw.room,
            device_type: raw.device_type,
            capabilities,
            attributes,
            last_activity: None,
        }
    }
}

// ── Mode / HSM ─────────────────────────────────────────────────────

impl From<MakerMode> for Mode {
    fn from(raw: MakerMode) -> Self {
        Mode {
            id: raw.id,
            name: raw.name,
            active: raw.active,
        }
    }
}

impl TryFrom<HsmStatus> for SecurityState {
    type Error = CoreError;

    fn try_from(raw: HsmStatus) -> Result<Self, Self::Error> {
        parse_security_state(&raw.hsm)
    }
}

pub fn parse_security_state(raw: &str) -> Result<SecurityState, CoreError> {
    raw.parse().map_err(|_| CoreError::UnexpectedValue {
        field: "hsmStatus".into(),
        value: raw.to_owned(),
    })
}

// ── Event ──────────────────────────────────────────────────────────

/// Convert an event-socket frame, stamping it with the time it was received.
pub fn event_from_maker(raw: MakerEvent, received_at: DateTime<Utc>) -> Result<Event, CoreError> {
    let value = raw.value.ok_or_else(|| CoreError::UnexpectedValue {
        field: raw.name.clone(),
        value: "null".into(),
    })?;

    Ok(Event {
        device_id: raw.device_id.filter(|id| *id != 0).map(DeviceId),
        alias: raw.display_name,
        key: raw.name,
        value,
        timestamp: received_at,
    })
}

impl TryFrom<MakerEvent> for Event {
    type Error = CoreError;

    fn try_from(raw: MakerEvent) -> Result<Self, Self::Error> {
        event_from_maker(raw, Utc::now())
    }
}
