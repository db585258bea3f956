// hubitat-api: Async Rust client for the Hubitat Maker API (cloud + local)

pub mod endpoint;
pub mod error;
pub mod event;
pub mod maker;
pub mod transport;

pub use endpoint::{CLOUD_API_HOST, HubAccess, MakerEndpoint};
pub use error::Error;
pub use event::MakerEvent;
pub use maker::MakerClient;
pub use maker::models::{
    HsmStatus, MakerAttribute, MakerCommand, MakerDevice, MakerDeviceDetail, MakerDeviceEvent,
    MakerMode, scalar_to_string,
};
pub use transport::{TlsMode, TransportConfig};
