//! Presence command handlers.

use hubitat_core::Capability;

use crate::cli::{GlobalOpts, PresenceArgs, PresenceCommand};
use crate::error::CliError;

use super::{Hub, util};

pub async fn handle(hub: &Hub, args: PresenceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PresenceCommand::List { present } => {
            let aliases = if present {
                hub.get_present_users().await?
            } else {
                hub.get_users().await?
            };
            util::list_states(hub, &Capability::PresenceSensor, "presence", aliases, global).await
        }

        PresenceCommand::Arrived { alias } => {
            let response = hub.arrived(&alias).await?;
            util::command_sent(&format!("{alias} arrived"), &response, global)
        }

        PresenceCommand::Departed { alias } => {
            let response = hub.departed(&alias).await?;
            util::command_sent(&format!("{alias} departed"), &response, global)
        }
    }
}
