//! Shared configuration for hubitat tools.
//!
//! TOML profiles, access token resolution (env + keyring + plaintext),
//! and translation to `hubitat_core::HubConfig` / `CacheOptions`. The CLI
//! layers its global flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hubitat_api::CLOUD_API_HOST;
use hubitat_core::{AliasKey, CacheOptions, CacheStrategy, HubConfig, HubLocation, TlsVerification};

/// Service name for keyring entries.
pub const KEYRING_SERVICE: &str = "hubitat";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no access token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named hub profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub alias_key: AliasKey,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            alias_key: AliasKey::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named hub profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Hub base URL (e.g. "http://192.168.1.20"); the cloud relay when unset.
    pub host: Option<String>,

    /// Hub id, required for the cloud relay.
    pub hub_id: Option<String>,

    /// Maker API app id.
    pub app_id: String,

    /// Access token (plaintext -- prefer keyring or env var).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Device field used as the alias.
    pub alias_key: Option<AliasKey>,

    /// Attribute cache strategy.
    pub cache: Option<CacheStrategy>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

impl Profile {
    /// The configured host, defaulting to the cloud relay.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(CLOUD_API_HOST)
    }
}

impl Config {
    /// The profile named `name`, or the default profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "hubitat-rs", "hubitat").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hubitat");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment overrides use `HUBITAT_` and `__` as the nesting separator,
/// e.g. `HUBITAT_DEFAULTS__TIMEOUT=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HUBITAT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/access-token"),
    )?)
}

/// Resolve a Maker API access token from the credential chain.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's access_token_env → env var lookup
    if let Some(ref env_name) = profile.access_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.access_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an access token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Work out where the hub lives from a host string and optional hub id.
pub fn resolve_location(host: &str, hub_id: Option<&str>) -> Result<HubLocation, ConfigError> {
    if host.trim_end_matches('/') == CLOUD_API_HOST {
        let hub_id = hub_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigError::Validation {
                field: "hub_id".into(),
                reason: "required when using the cloud relay".into(),
            })?;
        return Ok(HubLocation::Cloud {
            hub_id: hub_id.to_owned(),
        });
    }

    let url = host.parse().map_err(|_| ConfigError::Validation {
        field: "host".into(),
        reason: format!("invalid URL: {host}"),
    })?;
    Ok(HubLocation::Local { url })
}

/// Build a `HubConfig` from a profile and an already-resolved token.
///
/// Token resolution is left to the caller so a `--token` flag can win over
/// the keyring (see [`resolve_token`]).
pub fn profile_to_hub_config(
    profile: &Profile,
    access_token: SecretString,
    defaults: &Defaults,
) -> Result<HubConfig, ConfigError> {
    if profile.app_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "app_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let location = resolve_location(profile.host(), profile.hub_id.as_deref())?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(HubConfig {
        location,
        app_id: profile.app_id.clone(),
        access_token,
        tls,
        timeout,
    })
}

/// Cache options for a profile, falling back to the global defaults.
pub fn profile_cache_options(profile: &Profile, defaults: &Defaults) -> CacheOptions {
    CacheOptions::default()
        .with_alias_key(profile.alias_key.unwrap_or(defaults.alias_key))
        .with_strategy(profile.cache.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    fn token() -> SecretString {
        SecretString::from("plain-token".to_owned())
    }

    fn local_profile() -> Profile {
        Profile {
            host: Some("http://192.168.1.20".into()),
            app_id: "42".into(),
            access_token: Some("plain-token".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn local_profile_translates() {
        let cfg = profile_to_hub_config(&local_profile(), token(), &Defaults::default()).unwrap();

        assert!(matches!(cfg.location, HubLocation::Local { ref url } if url.as_str() == "http://192.168.1.20/"));
        assert_eq!(cfg.app_id, "42");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn cloud_is_the_default_host_and_needs_hub_id() {
        let mut profile = local_profile();
        profile.host = None;

        let err = profile_to_hub_config(&profile, token(), &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "hub_id"));

        profile.hub_id = Some("abc-123".into());
        let cfg = profile_to_hub_config(&profile, token(), &Defaults::default()).unwrap();
        assert_eq!(
            cfg.location,
            HubLocation::Cloud {
                hub_id: "abc-123".into()
            }
        );
    }

    #[test]
    fn plaintext_token_is_the_last_resort() {
        let profile = local_profile();
        let token = resolve_token(&profile, "hubitat-config-test-plaintext").unwrap();
        assert_eq!(token.expose_secret(), "plain-token");
    }

    #[test]
    fn empty_app_id_is_rejected() {
        let mut profile = local_profile();
        profile.app_id = "  ".into();
        let err = profile_to_hub_config(&profile, token(), &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "app_id"));
    }

    #[test]
    fn missing_token_is_reported() {
        let mut profile = local_profile();
        profile.access_token = None;

        let err = resolve_token(&profile, "hubitat-config-test-missing").unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "hubitat-config-test-missing"));
    }

    #[test]
    fn insecure_and_ca_cert_select_tls_mode() {
        let mut profile = local_profile();
        profile.ca_cert = Some(PathBuf::from("/etc/hub-ca.pem"));
        let cfg = profile_to_hub_config(&profile, token(), &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsVerification::CustomCa(PathBuf::from("/etc/hub-ca.pem")));

        profile.insecure = Some(true);
        let cfg = profile_to_hub_config(&profile, token(), &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn cache_options_fall_back_to_defaults() {
        let mut profile = local_profile();
        let defaults = Defaults {
            alias_key: AliasKey::Name,
            ..Defaults::default()
        };

        let options = profile_cache_options(&profile, &defaults);
        assert_eq!(options.alias_key, AliasKey::Name);
        assert_eq!(options.strategy, CacheStrategy::Pull);

        profile.alias_key = Some(AliasKey::Label);
        profile.cache = Some(CacheStrategy::Reconciled);
        let options = profile_cache_options(&profile, &defaults);
        assert_eq!(options.alias_key, AliasKey::Label);
        assert_eq!(options.strategy, CacheStrategy::Reconciled);
    }

    #[test]
    fn loads_profiles_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_profile = "home"

[defaults]
timeout = 10
alias_key = "name"

[profiles.home]
host = "http://hubitat.local"
app_id = "7"
access_token_env = "HUBITAT_TEST_UNSET_TOKEN_VAR"
cache = "reconciled"
"#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        let (name, profile) = config.profile(None).unwrap();

        assert_eq!(name, "home");
        assert_eq!(profile.app_id, "7");
        assert_eq!(profile.cache, Some(CacheStrategy::Reconciled));
        assert_eq!(config.defaults.timeout, 10);
        assert_eq!(config.defaults.alias_key, AliasKey::Name);
        assert!(matches!(
            config.profile(Some("office")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.profiles.insert("default".into(), local_profile());
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let (_, profile) = loaded.profile(None).unwrap();
        assert_eq!(profile.host(), "http://192.168.1.20");
    }
}
