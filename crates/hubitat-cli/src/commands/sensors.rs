//! Read-only sensor handlers: contact and motion.

use hubitat_core::Capability;

use crate::cli::{ContactsArgs, ContactsCommand, GlobalOpts, MotionArgs, MotionCommand};
use crate::error::CliError;

use super::{Hub, util};

pub async fn handle_contacts(
    hub: &Hub,
    args: ContactsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ContactsCommand::List { open } => {
            let aliases = if open {
                hub.get_open_doors().await?
            } else {
                hub.get_contact_sensors().await?
            };
            util::list_states(hub, &Capability::ContactSensor, "contact", aliases, global).await
        }
    }
}

pub async fn handle_motion(
    hub: &Hub,
    args: MotionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MotionCommand::List { active } => {
            let aliases = if active {
                hub.get_active_motion().await?
            } else {
                hub.get_motion_sensors().await?
            };
            util::list_states(hub, &Capability::MotionSensor, "motion", aliases, global).await
        }
    }
}
