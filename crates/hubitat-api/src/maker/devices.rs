// Maker API device endpoints
//
// Listing, per-device detail and command dispatch. Commands are plain GETs:
// `/devices/{id}/{command}[/{v1,v2,...}]`.

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::maker::client::MakerClient;
use crate::maker::models::{MakerCommand, MakerDevice, MakerDeviceDetail, MakerDeviceEvent};

impl MakerClient {
    /// List devices exposed to the Maker app.
    ///
    /// `brief` selects `GET /devices` (id, name, label only); otherwise
    /// `GET /devices/all` returns capabilities, attributes and room.
    pub async fn list_devices(&self, brief: bool) -> Result<Vec<MakerDevice>, Error> {
        debug!(brief, "listing devices");
        if brief {
            self.get(&["devices"]).await
        } else {
            self.get(&["devices", "all"]).await
        }
    }

    /// `GET /devices/{id}`
    pub async fn get_device(&self, device_id: i64) -> Result<MakerDeviceDetail, Error> {
        let id = device_id.to_string();
        self.get(&["devices", &id]).await
    }

    /// Recent events recorded by the hub for one device, newest first.
    ///
    /// `GET /devices/{id}/events`
    pub async fn get_device_events(&self, device_id: i64) -> Result<Vec<MakerDeviceEvent>, Error> {
        let id = device_id.to_string();
        self.get(&["devices", &id, "events"]).await
    }

    /// `GET /devices/{id}/commands`
    pub async fn get_device_commands(&self, device_id: i64) -> Result<Vec<MakerCommand>, Error> {
        let id = device_id.to_string();
        self.get(&["devices", &id, "commands"]).await
    }

    /// Send a command to a device, returning the hub's raw JSON answer.
    ///
    /// Secondary values are joined with `,` into a single path segment, the
    /// way the hub expects multi-argument commands such as
    /// `setVolumeAndSpeak/40,hello`.
    pub async fn send_device_command(
        &self,
        device_id: i64,
        command: &str,
        args: &[String],
    ) -> Result<Value, Error> {
        let id = device_id.to_string();
        debug!(device_id, command, nargs = args.len(), "sending device command");
        if args.is_empty() {
            self.get(&["devices", &id, command]).await
        } else {
            let joined = args.join(",");
            self.get(&["devices", &id, command, &joined]).await
        }
    }
}
