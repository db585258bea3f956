//! Switch command handlers.

use hubitat_core::Capability;

use crate::cli::{GlobalOpts, SwitchesArgs, SwitchesCommand};
use crate::error::CliError;

use super::{Hub, util};

pub async fn handle(hub: &Hub, args: SwitchesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SwitchesCommand::List { on } => {
            let aliases = if on {
                hub.get_on_switches().await?
            } else {
                hub.get_switches().await?
            };
            util::list_states(hub, &Capability::Switch, "switch", aliases, global).await
        }

        SwitchesCommand::On { alias } => {
            let response = hub.turn_on_switch(&alias).await?;
            util::command_sent(&format!("Turned on {alias}"), &response, global)
        }

        SwitchesCommand::Off { alias } => {
            let response = hub.turn_off_switch(&alias).await?;
            util::command_sent(&format!("Turned off {alias}"), &response, global)
        }
    }
}
