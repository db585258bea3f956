// ── Capability tags ──

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A class of device behaviour, as named by the hub.
///
/// The tags the client has accessors for get their own variant; anything
/// else is carried verbatim in [`Capability::Other`]. Always build values
/// through [`FromStr`] or [`From<&str>`] so a known tag never ends up
/// wrapped in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Capability {
    ContactSensor,
    DoorControl,
    Lock,
    MotionSensor,
    Switch,
    PresenceSensor,
    IlluminanceMeasurement,
    SpeechSynthesis,
    Other(String),
}

impl Capability {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ContactSensor => "ContactSensor",
            Self::DoorControl => "DoorControl",
            Self::Lock => "Lock",
            Self::MotionSensor => "MotionSensor",
            Self::Switch => "Switch",
            Self::PresenceSensor => "PresenceSensor",
            Self::IlluminanceMeasurement => "IlluminanceMeasurement",
            Self::SpeechSynthesis => "SpeechSynthesis",
            Self::Other(name) => name,
        }
    }

    /// The capability that owns a device attribute key.
    ///
    /// Only keys the event reconciler tracks are mapped; `mode` and
    /// `hsmStatus` are location state and map to nothing.
    pub fn for_attribute(key: &str) -> Option<Self> {
        match key {
            "contact" => Some(Self::ContactSensor),
            "lock" => Some(Self::Lock),
            "motion" => Some(Self::MotionSensor),
            "switch" => Some(Self::Switch),
            "presence" => Some(Self::PresenceSensor),
            "illuminance" => Some(Self::IlluminanceMeasurement),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Capability {
    fn from(raw: &str) -> Self {
        match raw {
            "ContactSensor" => Self::ContactSensor,
            "DoorControl" => Self::DoorControl,
            "Lock" => Self::Lock,
            "MotionSensor" => Self::MotionSensor,
            "Switch" => Self::Switch,
            "PresenceSensor" => Self::PresenceSensor,
            "IlluminanceMeasurement" => Self::IlluminanceMeasurement,
            "SpeechSynthesis" => Self::SpeechSynthesis,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for Capability {
    fn from(raw: String) -> Self {
        match Self::from(raw.as_str()) {
            Self::Other(_) => Self::Other(raw),
            known => known,
        }
    }
}

impl From<Capability> for String {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for Capability {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}
