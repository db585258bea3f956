//! Command dispatch: bridges CLI args -> `HubClient` calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod doors;
pub mod hsm;
pub mod locks;
pub mod lux;
pub mod mode;
pub mod presence;
pub mod sensors;
pub mod speak;
pub mod switches;
pub mod util;

use hubitat_api::MakerClient;
use hubitat_core::HubClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// The client every hub-bound command runs against.
pub type Hub = HubClient<MakerClient>;

/// Dispatch a hub-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(hub, args, global).await,
        Command::Switches(args) => switches::handle(hub, args, global).await,
        Command::Locks(args) => locks::handle(hub, args, global).await,
        Command::Doors(args) => doors::handle(hub, args, global).await,
        Command::Contacts(args) => sensors::handle_contacts(hub, args, global).await,
        Command::Motion(args) => sensors::handle_motion(hub, args, global).await,
        Command::Presence(args) => presence::handle(hub, args, global).await,
        Command::Lux(args) => lux::handle(hub, args, global).await,
        Command::Mode(args) => mode::handle(hub, args, global).await,
        Command::Hsm(args) => hsm::handle(hub, args, global).await,
        Command::Speak(args) => speak::handle(hub, args, global).await,
        // Config and Completions never reach a hub
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled before connecting".into(),
        }),
    }
}
