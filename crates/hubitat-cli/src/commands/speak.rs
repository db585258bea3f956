//! Speech (Echo Speaks) handlers.

use crate::cli::{GlobalOpts, SpeakArgs, SpeakCommand};
use crate::error::CliError;
use crate::output;

use super::{Hub, util};

pub async fn handle(hub: &Hub, args: SpeakArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SpeakCommand::Say {
            alias,
            message,
            volume,
            restore,
        } => {
            let response = match (volume, restore) {
                (Some(volume), Some(restore)) => {
                    hub.echo_set_volume_speak_and_restore(&alias, volume, &message, restore)
                        .await?
                }
                (Some(volume), None) => {
                    hub.echo_set_volume_and_speak(&alias, volume, &message)
                        .await?
                }
                (None, _) => hub.echo_parallel_speak(&alias, &message).await?,
            };
            util::command_sent(&format!("Spoke on {alias}"), &response, global)
        }

        SpeakCommand::Announce {
            alias,
            message,
            all,
        } => {
            let response = if all {
                hub.echo_play_announcement_all(&alias, &message).await?
            } else {
                hub.echo_play_announcement(&alias, &message).await?
            };
            util::command_sent(&format!("Announced on {alias}"), &response, global)
        }

        SpeakCommand::Voice { alias, message } => {
            let response = hub.echo_voice_cmd_as_text(&alias, &message).await?;
            util::command_sent(&format!("Sent voice command to {alias}"), &response, global)
        }

        SpeakCommand::Room {
            room,
            message,
            announce,
        } => {
            let report = if announce {
                hub.echo_room_announce(&room, &message).await?
            } else {
                hub.echo_room_speak(&room, &message).await?
            };

            let sent: Vec<String> = report.sent.iter().cloned().collect();
            let out = output::render_list(
                &global.output,
                &sent,
                |s| output::AliasRow::from(s),
                String::clone,
            )?;
            output::print_output(&out, global.quiet);

            for (alias, err) in &report.failed {
                eprintln!("{alias}: {err}");
            }
            if report.is_complete() {
                Ok(())
            } else {
                Err(CliError::PartialBroadcast {
                    failed: report.failed.len(),
                    total: report.failed.len() + report.sent.len(),
                    room,
                })
            }
        }
    }
}
