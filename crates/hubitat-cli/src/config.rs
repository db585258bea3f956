//! Global flag overlay: turns the active profile plus `GlobalOpts` into the
//! `HubConfig` and `CacheOptions` core expects.
//!
//! Loading, saving, and token lookup live in `hubitat-config`.

use secrecy::SecretString;

use hubitat_config::{Config, Profile};
use hubitat_core::{AliasKey, CacheOptions, HubConfig};

use crate::cli::{AliasKeyArg, GlobalOpts};
use crate::error::CliError;

pub use hubitat_config::{config_path, load_config_or_default, save_config};

impl From<AliasKeyArg> for AliasKey {
    fn from(arg: AliasKeyArg) -> Self {
        match arg {
            AliasKeyArg::Label => Self::Label,
            AliasKeyArg::Name => Self::Name,
        }
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Apply flag overrides on top of a profile (flag > env > profile).
fn overlay(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref host) = global.host {
        profile.host = Some(host.clone());
    }
    if let Some(ref hub_id) = global.hub_id {
        profile.hub_id = Some(hub_id.clone());
    }
    if let Some(ref app_id) = global.app_id {
        profile.app_id.clone_from(app_id);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(alias_key) = global.alias_key {
        profile.alias_key = Some(alias_key.into());
    }
    profile
}

/// Build the hub connection and cache settings for this invocation.
///
/// Without a matching profile, the flags alone must name an app id and a
/// token.
pub fn resolve(global: &GlobalOpts) -> Result<(HubConfig, CacheOptions), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.app_id.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };
    let profile = overlay(base, global);

    let token = match global.token {
        Some(ref token) => SecretString::from(token.clone()),
        None => hubitat_config::resolve_token(&profile, &profile_name)?,
    };

    let hub = hubitat_config::profile_to_hub_config(&profile, token, &cfg.defaults)?;
    let cache = hubitat_config::profile_cache_options(&profile, &cfg.defaults);
    tracing::debug!(profile = %profile_name, host = profile.host(), "resolved hub settings");
    Ok((hub, cache))
}
