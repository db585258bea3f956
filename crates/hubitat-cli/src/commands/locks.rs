//! Lock command handlers.

use hubitat_core::Capability;

use crate::cli::{GlobalOpts, LocksArgs, LocksCommand};
use crate::error::CliError;

use super::{Hub, util};

pub async fn handle(hub: &Hub, args: LocksArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        LocksCommand::List { unlocked } => {
            let aliases = if unlocked {
                hub.get_unlocked_doors().await?
            } else {
                hub.get_locks().await?
            };
            util::list_states(hub, &Capability::Lock, "lock", aliases, global).await
        }

        LocksCommand::Lock { alias } => {
            let response = hub.lock_door(&alias).await?;
            util::command_sent(&format!("Locked {alias}"), &response, global)
        }

        LocksCommand::Unlock { alias } => {
            let response = hub.unlock_door(&alias).await?;
            util::command_sent(&format!("Unlocked {alias}"), &response, global)
        }
    }
}
