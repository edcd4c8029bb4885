//! Shared configuration for the miwifi CLI.
//!
//! TOML router profiles, credential resolution (env + keyring + plaintext),
//! and translation to `miwifi_core::RouterConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use miwifi_core::{Endpoint, RefreshPolicy, RouterConfig, TlsVerification};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "miwifi";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "MIWIFI_CONFIG";

/// Environment variable checked for the router password.
pub const PASSWORD_ENV: &str = "MIWIFI_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
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

// ── Durations ───────────────────────────────────────────────────────

/// A duration written either as whole seconds (`30`) or in humantime
/// form (`"30s"`, `"2m"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DurationSetting {
    Seconds(u64),
    Text(String),
}

impl DurationSetting {
    pub fn to_duration(&self, field: &str) -> Result<Duration, ConfigError> {
        match self {
            Self::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            Self::Text(text) => {
                humantime::parse_duration(text).map_err(|e| ConfigError::Validation {
                    field: field.into(),
                    reason: format!("'{text}': {e}"),
                })
            }
        }
    }
}

impl From<Duration> for DurationSetting {
    fn from(duration: Duration) -> Self {
        Self::Text(humantime::format_duration(duration).to_string())
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

    /// Named router profiles.
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

    /// Accept self-signed router certificates.
    #[serde(default = "default_insecure")]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: DurationSetting,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: DurationSetting,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: default_insecure(),
            timeout: default_timeout(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_insecure() -> bool {
    true
}
fn default_timeout() -> DurationSetting {
    DurationSetting::Seconds(10)
}
fn default_refresh_interval() -> DurationSetting {
    DurationSetting::Seconds(60)
}
fn default_host() -> String {
    miwifi_core::RouterConfig::default().host
}

/// A named router profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Router address (e.g., "192.168.31.1" or "https://router.lan").
    #[serde(default = "default_host")]
    pub host: String,

    /// Login username (defaults to "admin").
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Look the password up in the system keyring.
    pub use_keyring: Option<bool>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout.
    pub timeout: Option<DurationSetting>,

    /// Override the default refresh window.
    pub refresh_interval: Option<DurationSetting>,

    /// Per-endpoint refresh windows, keyed by endpoint name.
    #[serde(default)]
    pub intervals: HashMap<String, DurationSetting>,

    /// Keep failed fetches for the whole refresh window.
    pub cache_failures: Option<bool>,

    /// Log in again once when the session expires.
    pub relogin: Option<bool>,
}

impl Profile {
    /// A profile for `host` with every other field unset.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$MIWIFI_CONFIG`, then platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "miwifi").map_or_else(
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
    p.push("miwifi");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// `MIWIFI_`-prefixed variables override file values; nested keys are
/// separated by `__` (`MIWIFI_PROFILES__HOME__HOST`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MIWIFI_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Resolve the router password from the credential chain.
///
/// Order: the profile's `password_env` variable, `MIWIFI_PASSWORD`, the
/// system keyring, then the plaintext `password` field.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(val) = profile
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok(SecretString::from(val));
    }

    // 2. Well-known env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if profile.use_keyring.unwrap_or(true) {
        if let Some(secret) = keyring_entry(profile_name)
            .ok()
            .and_then(|entry| entry.get_password().ok())
        {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

// ── Translation to RouterConfig ─────────────────────────────────────

impl Config {
    /// The profile to use when none is named: `default_profile`, or the
    /// only profile when exactly one exists.
    pub fn default_profile_name(&self) -> Option<&str> {
        if let Some(name) = self.default_profile.as_deref() {
            if self.profiles.contains_key(name) {
                return Some(name);
            }
        }
        let mut names = self.profiles.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }

    /// Build the `RouterConfig` for a named profile.
    pub fn router_config(&self, name: &str) -> Result<RouterConfig, ConfigError> {
        profile_to_router_config(self.profile(name)?, name, &self.defaults)
    }
}

/// Resolve the TLS strategy: a CA file wins, then `insecure`.
pub fn resolve_tls(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build the refresh policy from the profile, falling back to defaults.
pub fn resolve_refresh(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<RefreshPolicy, ConfigError> {
    let default_interval = profile
        .refresh_interval
        .as_ref()
        .unwrap_or(&defaults.refresh_interval)
        .to_duration("refresh_interval")?;

    let mut policy = RefreshPolicy::uniform(default_interval)
        .with_cache_failures(profile.cache_failures.unwrap_or(true));

    for (name, interval) in &profile.intervals {
        let endpoint = Endpoint::from_str(name).map_err(|_| ConfigError::Validation {
            field: "intervals".into(),
            reason: format!("unknown endpoint '{name}'"),
        })?;
        let field = format!("intervals.{name}");
        policy = policy.with_interval(endpoint, interval.to_duration(&field)?);
    }
    Ok(policy)
}

/// Build a `RouterConfig` from a profile, without CLI flag overrides.
pub fn profile_to_router_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<RouterConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let password = resolve_password(profile, profile_name)?;
    let timeout = profile
        .timeout
        .as_ref()
        .unwrap_or(&defaults.timeout)
        .to_duration("timeout")?;

    Ok(RouterConfig {
        host: profile.host.clone(),
        username: profile
            .username
            .clone()
            .unwrap_or_else(|| RouterConfig::default().username),
        password,
        tls: resolve_tls(profile, defaults),
        timeout,
        refresh: resolve_refresh(profile, defaults)?,
        relogin_on_expiry: profile.relogin.unwrap_or(true),
    })
}
