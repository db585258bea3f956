// ── Hubitat Safety Monitor ──
//
// HSM reports states (`armedAway`) but accepts commands (`armAway`); the two
// vocabularies only partly overlap.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Status reported by `/hsm` and `hsmStatus` events.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SecurityState {
    ArmedAway,
    ArmingAway,
    ArmedHome,
    ArmingHome,
    ArmedNight,
    ArmingNight,
    Disarmed,
    AllDisarmed,
}

impl SecurityState {
    /// The command that drives HSM into this state.
    ///
    /// Transitional `arming*` states cannot be requested directly.
    pub fn command(self) -> Option<SecurityCommand> {
        match self {
            Self::ArmedAway => Some(SecurityCommand::ArmAway),
            Self::ArmedHome => Some(SecurityCommand::ArmHome),
            Self::ArmedNight => Some(SecurityCommand::ArmNight),
            Self::Disarmed => Some(SecurityCommand::Disarm),
            Self::AllDisarmed => Some(SecurityCommand::DisarmAll),
            Self::ArmingAway | Self::ArmingHome | Self::ArmingNight => None,
        }
    }
}

/// Commands accepted by `/hsm/{command}`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SecurityCommand {
    ArmAway,
    ArmHome,
    ArmNight,
    Disarm,
    DisarmAll,
    ArmAll,
    CancelAlerts,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn wire_names_are_camel_case() {
        assert_eq!(SecurityState::AllDisarmed.to_string(), "allDisarmed");
        assert_eq!("armedNight".parse::<SecurityState>().ok(), Some(SecurityState::ArmedNight));
        assert_eq!(SecurityCommand::CancelAlerts.as_ref(), "cancelAlerts");
    }

    #[test]
    fn settled_states_map_to_commands() {
        assert_eq!(SecurityState::ArmedAway.command(), Some(SecurityCommand::ArmAway));
        assert_eq!(SecurityState::ArmedHome.command(), Some(SecurityCommand::ArmHome));
        assert_eq!(SecurityState::ArmedNight.command(), Some(SecurityCommand::ArmNight));
        assert_eq!(SecurityState::Disarmed.command(), Some(SecurityCommand::Disarm));
        assert_eq!(SecurityState::AllDisarmed.command(), Some(SecurityCommand::DisarmAll));
    }

    #[test]
    fn arming_states_have_no_command() {
        let unreachable: Vec<_> = SecurityState::iter()
            .filter(|s| s.command().is_none())
            .collect();
        assert_eq!(
            unreachable,
            [
                SecurityState::ArmingAway,
                SecurityState::ArmingHome,
                SecurityState::ArmingNight
            ]
        );
    }
}
