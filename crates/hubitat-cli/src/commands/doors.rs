//! Door controller command handlers.

use hubitat_core::Capability;

use crate::cli::{DoorsArgs, DoorsCommand, GlobalOpts};
use crate::error::CliError;

use super::{Hub, util};

pub async fn handle(hub: &Hub, args: DoorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DoorsCommand::List => {
            let aliases = hub.get_door_controls().await?;
            util::list_states(hub, &Capability::DoorControl, "door", aliases, global).await
        }

        DoorsCommand::Open { alias } => {
            let response = hub.open_door(&alias).await?;
            util::command_sent(&format!("Opening {alias}"), &response, global)
        }

        DoorsCommand::Close { alias } => {
            let response = hub.close_door(&alias).await?;
            util::command_sent(&format!("Closing {alias}"), &response, global)
        }
    }
}
