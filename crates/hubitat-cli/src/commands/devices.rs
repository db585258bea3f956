//! Device command handlers.

use hubitat_api::{MakerCommand, MakerDeviceEvent};
use hubitat_core::{AliasKey, Capability, Device, DeviceId};
use tabled::Tabled;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Hub, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Capabilities")]
    capabilities: usize,
}

impl DeviceRow {
    fn new(d: &Device, alias_key: AliasKey) -> Self {
        Self {
            id: d.id.0,
            alias: d.alias(alias_key).to_owned(),
            room: d.room.clone().unwrap_or_default(),
            device_type: d.device_type.clone().unwrap_or_default(),
            capabilities: d.capabilities.len(),
        }
    }
}

#[derive(Tabled)]
struct CapabilityRow {
    #[tabled(rename = "Capability")]
    name: String,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Attribute")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
}

impl EventRow {
    fn new(e: &MakerDeviceEvent, color: bool) -> Self {
        Self {
            date: e.date.clone().unwrap_or_default(),
            name: e.name.clone(),
            value: output::paint_state(e.value.as_deref().unwrap_or("-"), color),
            unit: e.unit.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct CommandRow {
    #[tabled(rename = "Command")]
    command: String,
    #[tabled(rename = "Arguments")]
    arguments: String,
}

impl From<&MakerCommand> for CommandRow {
    fn from(c: &MakerCommand) -> Self {
        Self {
            command: c.command.clone(),
            arguments: c.argument_types().collect::<Vec<_>>().join(", "),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(hub: &Hub, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List {
            capability: None, ..
        } => {
            let devices = hub.devices().await?;
            let alias_key = hub.options().alias_key;
            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::new(d, alias_key),
                |d| d.alias(alias_key).to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::List {
            capability: Some(capability),
            room,
        } => {
            let capability = Capability::from(capability);
            let aliases = match room {
                Some(ref room) => {
                    hub.devices_by_capability_and_room(&capability, Some(room))
                        .await?
                }
                None => hub.devices_by_capability(&capability).await?,
            };
            util::list_aliases(&aliases, global)
        }

        DevicesCommand::Capabilities { id } => {
            let capabilities: Vec<Capability> = hub
                .capabilities_for_device_id(DeviceId(id))
                .await?
                .into_iter()
                .collect();
            let out = output::render_list(
                &global.output,
                &capabilities,
                |c| CapabilityRow {
                    name: c.to_string(),
                },
                ToString::to_string,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Events { id, limit } => {
            let mut events = hub.api().get_device_events(id).await?;
            events.truncate(limit);
            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &events,
                |e| EventRow::new(e, color),
                |e| format!("{}={}", e.name, e.value.as_deref().unwrap_or_default()),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Commands { id } => {
            let commands = hub.api().get_device_commands(id).await?;
            let out = output::render_list(
                &global.output,
                &commands,
                |c| CommandRow::from(c),
                |c| c.command.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Value { alias, key } => {
            let value = hub
                .last_device_value(&alias, &key)
                .await?
                .ok_or_else(|| CliError::NotFound {
                    message: format!("No known {key} value for {alias}"),
                    list_command: "devices list".into(),
                })?;
            let out = output::render_single(&global.output, &value, String::clone, String::clone)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
