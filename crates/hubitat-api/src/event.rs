// Event-socket payload
//
// The hub pushes one JSON object per state change. Only `name` is always
// present; location events (mode, hsmStatus) carry no device id.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::maker::models::{de_opt_id, de_scalar};

/// A single state-change notification as delivered by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakerEvent {
    /// `DEVICE` or `LOCATION`.
    #[serde(default)]
    pub source: Option<String>,
    /// Attribute key, e.g. `switch` or `mode`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "de_scalar")]
    pub value: Option<String>,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub device_id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub hub_id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub installed_app_id: Option<i64>,
    #[serde(default)]
    pub description_text: Option<String>,
}

impl MakerEvent {
    /// Decode one event-socket frame.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: text.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_event() {
        let event = MakerEvent::from_json(
            r#"{"source":"DEVICE","name":"switch","displayName":"Porch Light",
                "value":"on","type":"physical","unit":null,"deviceId":2,
                "hubId":0,"installedAppId":0,"descriptionText":"Porch Light was turned on"}"#,
        )
        .unwrap();
        assert_eq!(event.name, "switch");
        assert_eq!(event.device_id, Some(2));
        assert_eq!(event.display_name.as_deref(), Some("Porch Light"));
        assert_eq!(event.value.as_deref(), Some("on"));
        assert_eq!(event.unit, None);
    }

    #[test]
    fn parses_location_event_without_device() {
        let event = MakerEvent::from_json(
            r#"{"source":"LOCATION","name":"mode","displayName":"Home","value":"Night","deviceId":0}"#,
        )
        .unwrap();
        assert_eq!(event.name, "mode");
        assert_eq!(event.value.as_deref(), Some("Night"));
        assert_eq!(event.device_id, Some(0));
    }

    #[test]
    fn numeric_value_is_stringified() {
        let event =
            MakerEvent::from_json(r#"{"name":"illuminance","value":42,"deviceId":"3"}"#).unwrap();
        assert_eq!(event.value.as_deref(), Some("42"));
        assert_eq!(event.device_id, Some(3));
    }

    #[test]
    fn malformed_frame_keeps_body() {
        let err = MakerEvent::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "{not json"));
    }
}
