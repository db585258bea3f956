// ── Event reconciliation ──
//
// Decides what a pushed event means for the cache. The tables themselves
// are mutated in `store::ReconciledCache`.

use strum::Display;

use crate::model::{Capability, Event, SecurityState};
use crate::store::CapabilityIndex;

/// Where an event's key is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTarget {
    /// The location mode singleton.
    Mode,
    /// The HSM status singleton.
    Security,
    /// A per-device attribute owned by a capability.
    Attribute(Capability),
    /// A key the cache does not track.
    Unmapped,
}

impl EventTarget {
    pub fn classify(key: &str) -> Self {
        match key {
            "mode" => Self::Mode,
            "hsmStatus" => Self::Security,
            other => Capability::for_attribute(other).map_or(Self::Unmapped, Self::Attribute),
        }
    }
}

/// What applying an event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Mode { previous: Option<String> },
    Security { previous: Option<SecurityState> },
    Attribute {
        capability: Capability,
        alias: String,
        previous: Option<String>,
    },
    Ignored(Ignored),
}

/// Why an event left the cache untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Ignored {
    UnmappedKey,
    UnknownSecurityState,
    UnresolvedAlias,
    /// The event carried no device id and its alias names several devices.
    AmbiguousAlias,
    /// The client pulls snapshots and does not consume events.
    NotReconciling,
}

/// The alias an event applies to.
///
/// A known device id wins, so events carrying a display name still land on
/// the right entry when aliases are driver names.
pub fn resolve_alias(event: &Event, index: &CapabilityIndex) -> Option<String> {
    event
        .device_id
        .and_then(|id| index.alias_for(id))
        .map(str::to_owned)
        .or_else(|| event.alias.clone())
}
