// ── Core error types ──
//
// Lookup failures are permanent for the query that raised them: the caller
// has to fix the aliasing on the hub. Failures from the Maker API pass
// through untouched so callers can inspect status codes and bodies.

use thiserror::Error;

use crate::model::{Capability, SecurityState};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Unable to find {capability} {alias}")]
    DeviceNotFound { capability: Capability, alias: String },

    #[error("Multiple devices found for {}", .aliases.join(","))]
    MultipleDevicesFound { aliases: Vec<String> },

    #[error("Mode not found: {name}")]
    ModeNotFound { name: String },

    // ── Value errors ─────────────────────────────────────────────────
    #[error("No HSM command reaches state {state}")]
    InvalidSecurityTarget { state: SecurityState },

    #[error("Unexpected value for {field}: {value:?}")]
    UnexpectedValue { field: String, value: String },

    // ── Remote Device API ────────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] hubitat_api::Error),
}

impl CoreError {
    /// Returns `true` for lookups that matched nothing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::DeviceNotFound { .. } | Self::ModeNotFound { .. } => true,
            Self::Api(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns `true` when an alias resolved to more than one device.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::MultipleDevicesFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguity_lists_every_alias() {
        let err = CoreError::MultipleDevicesFound {
            aliases: vec!["Den".into(), "Hall".into()],
        };
        assert_eq!(err.to_string(), "Multiple devices found for Den,Hall");
        assert!(err.is_ambiguous());
    }

    #[test]
    fn api_errors_pass_through() {
        let err = CoreError::from(hubitat_api::Error::Http {
            status: 404,
            body: "nope".into(),
        });
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Maker API error (HTTP 404): nope");
    }
}
