//! Hubitat Safety Monitor handlers.

use std::str::FromStr;

use strum::IntoEnumIterator;

use hubitat_core::{SecurityCommand, SecurityState};

use crate::cli::{GlobalOpts, HsmArgs, HsmCommand};
use crate::error::CliError;
use crate::output;

use super::Hub;

/// Parse a camelCase HSM name, listing the valid ones on failure.
fn parse_variant<T>(field: &str, raw: &str) -> Result<T, CliError>
where
    T: FromStr + IntoEnumIterator + std::fmt::Display,
{
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!(
            "'{raw}' is not one of: {}",
            T::iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}

pub async fn handle(hub: &Hub, args: HsmArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        HsmCommand::Get => {
            let state = hub.get_hsm().await?;
            let out = output::render_single(
                &global.output,
                &state,
                ToString::to_string,
                ToString::to_string,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HsmCommand::Set { state } => {
            let state: SecurityState = parse_variant("state", &state)?;
            hub.set_hsm(state).await?;
            if !global.quiet {
                eprintln!("HSM moving to {state}");
            }
            Ok(())
        }

        HsmCommand::Command { command } => {
            let command: SecurityCommand = parse_variant("command", &command)?;
            hub.send_hsm_command(command).await?;
            if !global.quiet {
                eprintln!("Sent HSM command {command}");
            }
            Ok(())
        }
    }
}
