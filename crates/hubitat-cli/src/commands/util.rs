//! Shared helpers for command handlers.

use std::collections::BTreeSet;

use serde_json::Value;

use hubitat_core::Capability;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, AliasRow, AliasState, AliasStateRow};

use super::Hub;

/// Print `aliases` alongside their current value of `key`.
///
/// Devices that have never reported `key` show `-`.
pub async fn list_states(
    hub: &Hub,
    capability: &Capability,
    key: &str,
    aliases: BTreeSet<String>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let values = hub.attribute_values(capability, key).await?;
    let items: Vec<AliasState> = aliases
        .into_iter()
        .map(|alias| {
            let state = values.get(&alias).cloned().unwrap_or_else(|| "-".into());
            AliasState { alias, state }
        })
        .collect();

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &items,
        |s| AliasStateRow::new(s, color),
        |s| s.alias.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print a bare set of aliases.
pub fn list_aliases(aliases: &BTreeSet<String>, global: &GlobalOpts) -> Result<(), CliError> {
    let items: Vec<String> = aliases.iter().cloned().collect();
    let out = output::render_list(&global.output, &items, |s| AliasRow::from(s), String::clone)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Report a completed device command.
///
/// Structured formats get the hub's raw response; the rest get `summary`
/// on stderr.
pub fn command_sent(summary: &str, response: &Value, global: &GlobalOpts) -> Result<(), CliError> {
    if global.quiet {
        return Ok(());
    }
    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            eprintln!("{summary}");
            Ok(())
        }
        _ => {
            let out = output::render_single(&global.output, response, ToString::to_string, ToString::to_string)?;
            output::print_output(&out, false);
            Ok(())
        }
    }
}
