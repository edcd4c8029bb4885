//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use miwifi_config::ConfigError;
use miwifi_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to router at {url}")]
    #[diagnostic(
        code(miwifi::connection_failed),
        help(
            "Check that the router is reachable: {reason}\n\
             Try: miwifi login --insecure"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(miwifi::auth_failed),
        help(
            "Verify the router admin password.\n\
             Run: miwifi config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(miwifi::no_credentials),
        help(
            "Set MIWIFI_PASSWORD, configure password_env in the profile,\n\
             or run: miwifi config set-password"
        )
    )]
    NoCredentials { profile: String },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("Unknown endpoint '{name}'")]
    #[diagnostic(
        code(miwifi::unknown_endpoint),
        help("Run: miwifi endpoints to see available endpoints")
    )]
    UnknownEndpoint { name: String },

    #[error("Unknown reading '{key}'")]
    #[diagnostic(
        code(miwifi::unknown_reading),
        help("Run: miwifi readings to see available readings")
    )]
    UnknownReading { key: String },

    #[error("No value at '{key_path}' in {endpoint}")]
    #[diagnostic(
        code(miwifi::no_value),
        help("Run: miwifi get {endpoint} to inspect the raw response")
    )]
    NoValue { endpoint: String, key_path: String },

    #[error("No data returned by {endpoint}")]
    #[diagnostic(
        code(miwifi::no_data),
        help("Run again with -v to see why the request failed")
    )]
    NoData { endpoint: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(miwifi::api_error))]
    ApiError { message: String, status: Option<u16> },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(miwifi::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(miwifi::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: miwifi --host <HOST> config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No router configured")]
    #[diagnostic(
        code(miwifi::no_config),
        help(
            "Pass --host (or set MIWIFI_HOST), or create a profile with:\n\
             miwifi --host 192.168.31.1 config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(miwifi::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(miwifi::timeout),
        help("Increase timeout with --timeout or check router responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(miwifi::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(miwifi::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization failed: {0}")]
    #[diagnostic(code(miwifi::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NoValue { .. } | Self::NoData { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::UnknownEndpoint { .. }
            | Self::UnknownReading { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::SessionExpired => CliError::AuthFailed {
                message: "router session expired".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::UnknownReading { key } => CliError::UnknownReading { key },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            CoreError::Config { message } => CliError::Validation {
                field: "host".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => CliError::Config(other),
        }
    }
}
