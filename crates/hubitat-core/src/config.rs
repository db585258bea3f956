// ── Runtime configuration ──
//
// These types describe how to reach a hub and how aggressively to cache.
// They never touch disk: the CLI (or any embedding application) builds a
// `HubConfig` and `CacheOptions` and hands them in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use hubitat_api::transport::{TlsMode, TransportConfig};
use hubitat_api::{MakerClient, MakerEndpoint};

use crate::error::CoreError;
use crate::model::AliasKey;

/// Default lifetime of the capability index and the mode name map.
pub const DEFAULT_INDEX_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Default lifetime of a pulled attribute snapshot.
pub const DEFAULT_ATTRIBUTE_TTL: Duration = Duration::from_secs(2);

/// Where the hub is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubLocation {
    /// Hubitat's cloud relay, routed by hub id.
    Cloud { hub_id: String },
    /// A hub on the LAN (e.g. `http://192.168.1.20`).
    Local { url: Url },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs on a LAN hub).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single Maker API app.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub location: HubLocation,
    /// Installed Maker API app id.
    pub app_id: String,
    pub access_token: SecretString,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl HubConfig {
    pub fn endpoint(&self) -> Result<MakerEndpoint, CoreError> {
        let endpoint = match &self.location {
            HubLocation::Cloud { hub_id } => MakerEndpoint::cloud(hub_id.clone(), &*self.app_id)?,
            HubLocation::Local { url } => MakerEndpoint::local(url.clone(), &*self.app_id),
        };
        Ok(endpoint)
    }

    /// Build a Maker API client for this hub.
    pub fn maker_client(&self) -> Result<MakerClient, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
        };
        Ok(MakerClient::new(
            self.endpoint()?,
            self.access_token.clone(),
            &transport,
        )?)
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

/// How attribute values are kept current.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CacheStrategy {
    /// Re-fetch the device snapshot once it is older than the attribute TTL.
    #[default]
    Pull,
    /// Load once, then patch from pushed events.
    Reconciled,
}

/// Cache tuning for a [`HubClient`](crate::HubClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub alias_key: AliasKey,
    pub strategy: CacheStrategy,
    /// Lifetime of the capability index.
    pub index_ttl: Duration,
    /// Lifetime of a pulled attribute snapshot. Unused when reconciled.
    pub attribute_ttl: Duration,
    /// Lifetime of the mode name to id map.
    pub mode_ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            alias_key: AliasKey::Label,
            strategy: CacheStrategy::Pull,
            index_ttl: DEFAULT_INDEX_TTL,
            attribute_ttl: DEFAULT_ATTRIBUTE_TTL,
            mode_ttl: DEFAULT_INDEX_TTL,
        }
    }
}

impl CacheOptions {
    pub fn with_alias_key(mut self, alias_key: AliasKey) -> Self {
        self.alias_key = alias_key;
        self
    }

    pub fn with_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(location: HubLocation) -> HubConfig {
        HubConfig {
            location,
            app_id: "12".into(),
            access_token: SecretString::from("t".to_owned()),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn cloud_location_builds_cloud_endpoint() {
        let endpoint = config(HubLocation::Cloud {
            hub_id: "abc".into(),
        })
        .endpoint()
        .unwrap();
        assert_eq!(
            endpoint.url(&["hsm"]).unwrap().as_str(),
            "https://cloud.hubitat.com/api/abc/apps/12/hsm"
        );
    }

    #[test]
    fn cloud_location_needs_hub_id() {
        let err = config(HubLocation::Cloud { hub_id: String::new() })
            .endpoint()
            .unwrap_err();
        assert!(matches!(err, CoreError::Api(hubitat_api::Error::MissingHubId)));
    }

    #[test]
    fn defaults_follow_hub_cadence() {
        let options = CacheOptions::default();
        assert_eq!(options.index_ttl, Duration::from_secs(86_400));
        assert_eq!(options.attribute_ttl, Duration::from_secs(2));
        assert_eq!(options.strategy, CacheStrategy::Pull);
    }
}
