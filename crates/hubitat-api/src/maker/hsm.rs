// Hubitat Safety Monitor endpoints

use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::maker::client::MakerClient;
use crate::maker::models::HsmStatus;

impl MakerClient {
    /// `GET /hsm`
    pub async fn get_hsm(&self) -> Result<HsmStatus, Error> {
        self.get(&["hsm"]).await
    }

    /// Send a raw HSM command such as `armAway` or `cancelAlerts`.
    ///
    /// `GET /hsm/{command}`
    pub async fn send_hsm_command(&self, command: &str) -> Result<(), Error> {
        debug!(command, "sending hsm command");
        let _: Value = self.get(&["hsm", command]).await?;
        Ok(())
    }
}
