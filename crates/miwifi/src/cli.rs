//! Clap derive structures for the `miwifi` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// miwifi -- poll a Xiaomi MiWiFi 5G CPE router from the command line
#[derive(Debug, Parser)]
#[command(
    name = "miwifi",
    version,
    about = "Read status and signal values from Xiaomi MiWiFi routers",
    long_about = "Logs in to a Xiaomi MiWiFi router over its LuCI JSON API and reads\n\
        WAN throughput, Wi-Fi, SIM and cellular signal values.\n\n\
        Responses are cached per endpoint, so values that share an endpoint\n\
        cost a single request.",
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
    /// Router profile to use
    #[arg(long, short = 'p', env = "MIWIFI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router address (overrides profile)
    #[arg(long, short = 'H', env = "MIWIFI_HOST", global = true)]
    pub host: Option<String>,

    /// Login username (overrides profile)
    #[arg(long, short = 'u', env = "MIWIFI_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MIWIFI_OUTPUT",
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
    #[arg(long, short = 'k', env = "MIWIFI_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout (e.g. "10s", "1m")
    #[arg(long, env = "MIWIFI_TIMEOUT", value_parser = humantime::parse_duration, global = true)]
    pub timeout: Option<Duration>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and show the router identity
    Login,

    /// Evaluate router readings (all, or the named keys)
    #[command(alias = "r")]
    Readings(ReadingsArgs),

    /// Print one endpoint's raw JSON response
    Get(GetArgs),

    /// Extract one value from an endpoint response
    Read(ReadArgs),

    /// Poll readings on a fixed cadence until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// List the known API endpoints
    #[command(alias = "ep")]
    Endpoints,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReadingsArgs {
    /// Reading keys to evaluate (default: all)
    pub keys: Vec<String>,

    /// Include the stable per-reading identifier
    #[arg(long)]
    pub ids: bool,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Endpoint name (see `miwifi endpoints`)
    pub endpoint: String,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Endpoint name (see `miwifi endpoints`)
    pub endpoint: String,

    /// Dotted path into the response (e.g. "net.info.cell_band")
    pub key_path: String,

    /// Sub-key to select, or project across a list of objects
    #[arg(long, conflicts_with = "index")]
    pub key: Option<String>,

    /// Position to select in a list
    #[arg(long)]
    pub index: Option<usize>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Reading keys to poll (default: all)
    pub keys: Vec<String>,

    /// Poll cadence (default: the profile's refresh interval)
    #[arg(long, short = 'e', value_parser = humantime::parse_duration)]
    pub every: Option<Duration>,

    /// Stop after this many polls
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter profile to the config file
    Init(ConfigInitArgs),

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name (default: the active profile)
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Profile name
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Environment variable holding the password
    #[arg(long)]
    pub password_env: Option<String>,

    /// Prompt for the password and store it in the system keyring
    #[arg(long, conflicts_with = "password_env")]
    pub store_password: bool,

    /// Replace an existing profile of the same name
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
