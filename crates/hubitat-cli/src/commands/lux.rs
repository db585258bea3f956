//! Illuminance command handlers.

use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, LuxArgs, LuxCommand};
use crate::error::CliError;
use crate::output;

use super::{Hub, util};

#[derive(Serialize)]
struct LuxReading {
    alias: String,
    lux: i64,
}

#[derive(Tabled)]
struct LuxRow {
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "Lux")]
    lux: i64,
}

pub async fn handle(hub: &Hub, args: LuxArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        LuxCommand::List => {
            let readings: Vec<LuxReading> = hub
                .get_lux_readings()
                .await?
                .into_iter()
                .map(|(alias, lux)| LuxReading { alias, lux })
                .collect();
            let out = output::render_list(
                &global.output,
                &readings,
                |r| LuxRow {
                    alias: r.alias.clone(),
                    lux: r.lux,
                },
                |r| format!("{}\t{}", r.alias, r.lux),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LuxCommand::Set { alias, lux } => {
            let response = hub.set_lux(&alias, lux).await?;
            util::command_sent(&format!("Set {alias} to {lux} lux"), &response, global)
        }
    }
}
