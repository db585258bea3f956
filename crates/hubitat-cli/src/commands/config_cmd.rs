//! Config subcommand handlers.

use hubitat_config::{Config, Profile};
use hubitat_core::{AliasKey, CacheStrategy};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

/// Replace plaintext tokens before the config is echoed back.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.access_token.is_some() {
            profile.access_token = Some("********".into());
        }
    }
    cfg
}

fn summary(cfg: &Config) -> String {
    let default = cfg.default_profile.as_deref().unwrap_or("default");
    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();

    let mut lines = vec![format!("Config:  {}", config::config_path().display())];
    for name in names {
        let p = &cfg.profiles[name];
        let marker = if name == default { " *" } else { "" };
        lines.push(format!("\n[{name}]{marker}"));
        lines.push(format!("  host:   {}", p.host()));
        if let Some(ref hub_id) = p.hub_id {
            lines.push(format!("  hub id: {hub_id}"));
        }
        lines.push(format!("  app id: {}", p.app_id));
        lines.push(format!(
            "  cache:  {}",
            p.cache.unwrap_or_default()
        ));
    }
    lines.join("\n")
}

fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "host" => profile.host = Some(value),
        "hub_id" | "hub-id" => profile.hub_id = Some(value),
        "app_id" | "app-id" => profile.app_id = value,
        "access_token_env" | "access-token-env" => profile.access_token_env = Some(value),
        "alias_key" | "alias-key" => {
            profile.alias_key = Some(parse_field::<AliasKey>("alias_key", &value, "'label' or 'name'")?);
        }
        "cache" => {
            profile.cache = Some(parse_field::<CacheStrategy>(
                "cache",
                &value,
                "'pull' or 'reconciled'",
            )?);
        }
        "insecure" => {
            profile.insecure = Some(parse_field("insecure", &value, "'true' or 'false'")?);
        }
        "timeout" => {
            profile.timeout = Some(parse_field("timeout", &value, "a number (seconds)")?);
        }
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: host, hub_id, app_id, \
                     access_token_env, alias_key, cache, insecure, timeout, ca_cert"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = redacted(config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, summary, |_| {
                config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            set_key(profile, &key, value)?;

            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: hubitat config set app_id <id>");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetToken => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let token = rpassword::prompt_password("Access token: ").map_err(prompt_err)?;
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            hubitat_config::store_token(&profile_name, token.trim())?;
            if !global.quiet {
                eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}
