// ── Remote Device API seam ──
//
// Everything the cache layer needs from the hub, expressed in domain types.
// `MakerClient` is the production implementation; tests plug in fakes.

use std::future::Future;

use serde_json::Value;

use hubitat_api::MakerClient;

use crate::error::CoreError;
use crate::model::{Device, DeviceId, Mode, SecurityCommand, SecurityState};

/// Stateless request/response access to a hub.
pub trait RemoteDeviceApi: Send + Sync + 'static {
    /// Every device exposed to the app. `brief` omits capabilities and
    /// attributes.
    fn list_devices(&self, brief: bool) -> impl Future<Output = Result<Vec<Device>, CoreError>> + Send;

    fn get_device(&self, id: DeviceId) -> impl Future<Output = Result<Device, CoreError>> + Send;

    fn list_modes(&self) -> impl Future<Output = Result<Vec<Mode>, CoreError>> + Send;

    fn get_security_state(&self) -> impl Future<Output = Result<SecurityState, CoreError>> + Send;

    /// Send a device command, returning the hub's raw answer.
    fn send_device_command(
        &self,
        id: DeviceId,
        command: &str,
        args: &[String],
    ) -> impl Future<Output = Result<Value, CoreError>> + Send;

    fn set_mode(&self, mode_id: i64) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn send_security_command(
        &self,
        command: SecurityCommand,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl RemoteDeviceApi for MakerClient {
    async fn list_devices(&self, brief: bool) -> Result<Vec<Device>, CoreError> {
        let devices = MakerClient::list_devices(self, brief).await?;
        Ok(devices.into_iter().map(Device::from).collect())
    }

    async fn get_device(&self, id: DeviceId) -> Result<Device, CoreError> {
        Ok(MakerClient::get_device(self, id.0).await?.into())
    }

    async fn list_modes(&self) -> Result<Vec<Mode>, CoreError> {
        let modes = MakerClient::list_modes(self).await?;
        Ok(modes.into_iter().map(Mode::from).collect())
    }

    async fn get_security_state(&self) -> Result<SecurityState, CoreError> {
        self.get_hsm().await?.try_into()
    }

    async fn send_device_command(
        &self,
        id: DeviceId,
        command: &str,
        args: &[String],
    ) -> Result<Value, CoreError> {
        Ok(MakerClient::send_device_command(self, id.0, command, args).await?)
    }

    async fn set_mode(&self, mode_id: i64) -> Result<(), CoreError> {
        Ok(MakerClient::set_mode(self, mode_id).await?)
    }

    async fn send_security_command(&self, command: SecurityCommand) -> Result<(), CoreError> {
        Ok(self.send_hsm_command(command.as_ref()).await?)
    }
}
