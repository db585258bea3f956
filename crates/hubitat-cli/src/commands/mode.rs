//! Location mode handlers.

use crate::cli::{GlobalOpts, ModeArgs, ModeCommand};
use crate::error::CliError;
use crate::output;

use super::Hub;

pub async fn handle(hub: &Hub, args: ModeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ModeCommand::Get => {
            let mode = hub.get_mode().await?;
            let out = output::render_single(
                &global.output,
                &mode,
                |m| m.clone().unwrap_or_else(|| "-".into()),
                |m| m.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModeCommand::Set { name } => {
            hub.set_mode(&name).await?;
            if !global.quiet {
                eprintln!("Mode set to {name}");
            }
            Ok(())
        }
    }
}
