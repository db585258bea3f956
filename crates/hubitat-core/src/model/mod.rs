// ── Domain model ──
//
// Canonical representations of hub entities. Wire types from `hubitat_api`
// are converted into these in `crate::convert`.

pub mod capability;
pub mod device;
pub mod event;
pub mod mode;
pub mod security;

pub use capability::Capability;
pub use device::{AliasKey, Device, DeviceId};
pub use event::Event;
pub use mode::Mode;
pub use security::{SecurityCommand, SecurityState};
