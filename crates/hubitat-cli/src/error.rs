//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hubitat_config::ConfigError;
use hubitat_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const AMBIGUOUS: i32 = 5;
    pub const PARTIAL: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the hub")]
    #[diagnostic(
        code(hubitat::connection_failed),
        help(
            "Check that the hub is powered and reachable, and that the host is right.\n\
             Try: hubitat config show"
        )
    )]
    ConnectionFailed {
        #[source]
        source: hubitat_api::Error,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(hubitat::tls_error),
        help("Use --insecure (-k) for a self-signed hub, or configure ca_cert in your profile.")
    )]
    TlsError { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(hubitat::timeout),
        help("Increase timeout with --timeout or check hub responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("The hub rejected the access token")]
    #[diagnostic(
        code(hubitat::auth_failed),
        help(
            "Check the token and app id on the Maker API app page.\n\
             Run: hubitat config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No access token configured for profile '{profile}'")]
    #[diagnostic(
        code(hubitat::no_credentials),
        help(
            "Store one with: hubitat config set-token\n\
             Or set the HUBITAT_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(hubitat::not_found),
        help("Run: hubitat {list_command} to see what the hub knows")
    )]
    NotFound {
        message: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(hubitat::ambiguous),
        help("Give each device a unique label on the hub, or switch --alias-key.")
    )]
    Ambiguous { message: String },

    #[error("{failed} of {total} devices in room '{room}' failed")]
    #[diagnostic(code(hubitat::partial_broadcast))]
    PartialBroadcast {
        room: String,
        failed: usize,
        total: usize,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(hubitat::api_error))]
    Api(hubitat_api::Error),

    #[error("{0}")]
    #[diagnostic(code(hubitat::unexpected_value))]
    UnexpectedValue(String),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hubitat::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(hubitat::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: hubitat config set app_id <id>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No hub configured")]
    #[diagnostic(
        code(hubitat::no_config),
        help(
            "Pass --host and --app-id, or create a profile.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(hubitat::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Ambiguous { .. } => exit_code::AMBIGUOUS,
            Self::PartialBroadcast { .. } => exit_code::PARTIAL,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Upstream error mapping ───────────────────────────────────────────

impl From<hubitat_api::Error> for CliError {
    fn from(err: hubitat_api::Error) -> Self {
        if err.is_transient() {
            if matches!(&err, hubitat_api::Error::Transport(e) if e.is_timeout()) {
                return Self::Timeout;
            }
            return Self::ConnectionFailed { source: err };
        }
        if err.is_unauthorized() {
            return Self::AuthFailed {
                profile: "current".into(),
            };
        }
        match err {
            hubitat_api::Error::Tls(message) => Self::TlsError { message },
            other => Self::Api(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceNotFound { ref capability, .. } => Self::NotFound {
                list_command: format!("devices list --capability {capability}"),
                message: err.to_string(),
            },
            CoreError::ModeNotFound { .. } => Self::NotFound {
                message: err.to_string(),
                list_command: "mode get".into(),
            },
            CoreError::MultipleDevicesFound { .. } => Self::Ambiguous {
                message: err.to_string(),
            },
            CoreError::InvalidSecurityTarget { .. } => Self::Validation {
                field: "state".into(),
                reason: err.to_string(),
            },
            CoreError::UnexpectedValue { .. } => Self::UnexpectedValue(err.to_string()),
            CoreError::Api(api) => api.into(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(see: hubitat config profiles)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}
