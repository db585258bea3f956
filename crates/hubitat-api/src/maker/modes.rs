use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::maker::client::MakerClient;
use crate::maker::models::MakerMode;

impl MakerClient {
    /// `GET /modes`
    pub async fn list_modes(&self) -> Result<Vec<MakerMode>, Error> {
        self.get(&["modes"]).await
    }

    /// Activate a location mode.
    ///
    /// `GET /modes/{id}`
    pub async fn set_mode(&self, mode_id: i64) -> Result<(), Error> {
        debug!(mode_id, "setting mode");
        let id = mode_id.to_string();
        let _: Value = self.get(&["modes", &id]).await?;
        Ok(())
    }
}
