//! Clap derive structures for the `hubitat` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Kept free of workspace crates so `build.rs` can include it for man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hubitat -- query and drive a Hubitat hub through the Maker API
#[derive(Debug, Parser)]
#[command(
    name = "hubitat",
    version,
    about = "Control Hubitat devices from the command line",
    long_about = "Query and control devices on a Hubitat Elevation hub.\n\n\
        Talks to an installed Maker API app, either on the LAN or through\n\
        the Hubitat cloud relay. Devices are addressed by capability and alias.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Hub profile to use
    #[arg(long, short = 'p', env = "HUBITAT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Hub base URL, or https://cloud.hubitat.com for the relay (overrides profile)
    #[arg(long, short = 'H', env = "HUBITAT_HOST", global = true)]
    pub host: Option<String>,

    /// Hub id, required with the cloud relay
    #[arg(long, env = "HUBITAT_HUB_ID", global = true)]
    pub hub_id: Option<String>,

    /// Maker API app id
    #[arg(long, short = 'a', env = "HUBITAT_APP_ID", global = true)]
    pub app_id: Option<String>,

    /// Maker API access token
    #[arg(long, env = "HUBITAT_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Device field used as the alias
    #[arg(long, env = "HUBITAT_ALIAS_KEY", global = true)]
    pub alias_key: Option<AliasKeyArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HUBITAT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "HUBITAT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "HUBITAT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AliasKeyArg {
    /// Device label, falling back to the name
    Label,
    /// Device name as set by the driver
    Name,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List devices and inspect their capabilities
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// List and toggle switches
    #[command(alias = "sw")]
    Switches(SwitchesArgs),

    /// List, lock, and unlock locks
    Locks(LocksArgs),

    /// List, open, and close door controllers
    Doors(DoorsArgs),

    /// List contact sensors
    Contacts(ContactsArgs),

    /// List motion sensors
    Motion(MotionArgs),

    /// Track who is home
    Presence(PresenceArgs),

    /// Read and set illuminance sensors
    Lux(LuxArgs),

    /// Get or set the location mode
    Mode(ModeArgs),

    /// Hubitat Safety Monitor
    Hsm(HsmArgs),

    /// Speak or announce on Echo devices
    Speak(SpeakArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices, optionally narrowed by capability and room
    #[command(alias = "ls")]
    List {
        /// Only devices with this capability (e.g. Switch)
        #[arg(long, short = 'c')]
        capability: Option<String>,

        /// Only devices in this room (requires --capability)
        #[arg(long, short = 'r', requires = "capability")]
        room: Option<String>,
    },

    /// Show the capabilities the hub reports for a device id
    Capabilities {
        /// Numeric device id
        id: i64,
    },

    /// Show the hub's recent event log for a device id
    Events {
        /// Numeric device id
        id: i64,

        /// Show at most this many events
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,
    },

    /// List the commands a device's driver accepts
    Commands {
        /// Numeric device id
        id: i64,
    },

    /// Show the last known value of an attribute
    Value {
        /// Device alias
        alias: String,

        /// Attribute key (e.g. switch, contact)
        key: String,
    },
}

// ── Switches ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SwitchesArgs {
    #[command(subcommand)]
    pub command: SwitchesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SwitchesCommand {
    /// List switches
    #[command(alias = "ls")]
    List {
        /// Only switches that are on
        #[arg(long)]
        on: bool,
    },

    /// Turn a switch on
    On { alias: String },

    /// Turn a switch off
    Off { alias: String },
}

// ── Locks ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LocksArgs {
    #[command(subcommand)]
    pub command: LocksCommand,
}

#[derive(Debug, Subcommand)]
pub enum LocksCommand {
    /// List locks
    #[command(alias = "ls")]
    List {
        /// Only locks that are unlocked
        #[arg(long)]
        unlocked: bool,
    },

    /// Lock a lock
    Lock { alias: String },

    /// Unlock a lock
    Unlock { alias: String },
}

// ── Doors ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DoorsArgs {
    #[command(subcommand)]
    pub command: DoorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DoorsCommand {
    /// List door controllers
    #[command(alias = "ls")]
    List,

    /// Open a door
    Open { alias: String },

    /// Close a door
    Close { alias: String },
}

// ── Sensors ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ContactsArgs {
    #[command(subcommand)]
    pub command: ContactsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ContactsCommand {
    /// List contact sensors
    #[command(alias = "ls")]
    List {
        /// Only sensors reporting open
        #[arg(long)]
        open: bool,
    },
}

#[derive(Debug, Args)]
pub struct MotionArgs {
    #[command(subcommand)]
    pub command: MotionCommand,
}

#[derive(Debug, Subcommand)]
pub enum MotionCommand {
    /// List motion sensors
    #[command(alias = "ls")]
    List {
        /// Only sensors reporting motion
        #[arg(long)]
        active: bool,
    },
}

// ── Presence ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PresenceArgs {
    #[command(subcommand)]
    pub command: PresenceCommand,
}

#[derive(Debug, Subcommand)]
pub enum PresenceCommand {
    /// List presence sensors
    #[command(alias = "ls")]
    List {
        /// Only people who are present
        #[arg(long)]
        present: bool,
    },

    /// Mark a presence sensor as arrived
    Arrived { alias: String },

    /// Mark a presence sensor as departed
    Departed { alias: String },
}

// ── Lux ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LuxArgs {
    #[command(subcommand)]
    pub command: LuxCommand,
}

#[derive(Debug, Subcommand)]
pub enum LuxCommand {
    /// Current illuminance per sensor
    #[command(alias = "ls")]
    List,

    /// Set a virtual illuminance sensor's reading
    Set {
        alias: String,

        /// Illuminance in lux
        lux: i64,
    },
}

// ── Mode ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ModeArgs {
    #[command(subcommand)]
    pub command: ModeCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModeCommand {
    /// Show the active mode
    Get,

    /// Activate a mode by name
    Set { name: String },
}

// ── HSM ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HsmArgs {
    #[command(subcommand)]
    pub command: HsmCommand,
}

#[derive(Debug, Subcommand)]
pub enum HsmCommand {
    /// Show the current HSM status
    Get,

    /// Move HSM to a state (armedAway, armedHome, armedNight, disarmed, allDisarmed)
    Set { state: String },

    /// Send a raw HSM command (armAway, disarm, cancelAlerts, ...)
    Command { command: String },
}

// ── Speak ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SpeakArgs {
    #[command(subcommand)]
    pub command: SpeakCommand,
}

#[derive(Debug, Subcommand)]
pub enum SpeakCommand {
    /// Speak a message on one device
    Say {
        alias: String,
        message: String,

        /// Speak at this volume (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        volume: Option<u8>,

        /// Restore this volume afterwards (requires --volume)
        #[arg(long, requires = "volume", value_parser = clap::value_parser!(u8).range(0..=100))]
        restore: Option<u8>,
    },

    /// Play an announcement on one device
    Announce {
        alias: String,
        message: String,

        /// Announce on every Echo in the account
        #[arg(long)]
        all: bool,
    },

    /// Send a message to the device as if spoken to it
    Voice { alias: String, message: String },

    /// Speak on every speech device in a room
    Room {
        room: String,
        message: String,

        /// Play as an announcement instead of speech
        #[arg(long)]
        announce: bool,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key (host, hub_id, app_id, access_token_env, alias_key, cache, ca_cert, insecure, timeout)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's access token in the system keyring
    SetToken,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
