// hubitat-core: Capability-oriented cache and event reconciliation over the Maker API.

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod remote;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::{HubClient, RoomBroadcast};
pub use config::{CacheOptions, CacheStrategy, HubConfig, HubLocation, TlsVerification};
pub use error::CoreError;
pub use reconcile::{EventTarget, Ignored, Outcome};
pub use remote::RemoteDeviceApi;

pub use model::{
    AliasKey, Capability, Device, DeviceId, Event, Mode, SecurityCommand, SecurityState,
};
