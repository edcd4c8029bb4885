// ── Runtime connection configuration ──
//
// These types describe *how* to talk to one router and how long its
// responses stay fresh. They carry credential data but never touch disk;
// the CLI (or any other host) constructs a `RouterConfig` and hands it in.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use miwifi_api::transport::{DEFAULT_TIMEOUT, TlsMode, TransportConfig};
use miwifi_api::{Credentials, DEFAULT_HOST, DEFAULT_USERNAME, Endpoint};

/// Refresh window applied to endpoints without an override.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs). Default for LAN routers.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// How long cached endpoint responses stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Window for endpoints without an override.
    pub default_interval: Duration,
    /// Per-endpoint overrides.
    pub per_endpoint: HashMap<Endpoint, Duration>,
    /// Keep a failed fetch as an empty entry for the whole window instead
    /// of letting the next caller retry immediately.
    pub cache_failures: bool,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            default_interval: DEFAULT_REFRESH_INTERVAL,
            per_endpoint: HashMap::new(),
            cache_failures: true,
        }
    }
}

impl RefreshPolicy {
    /// A uniform policy with one window for every endpoint.
    pub fn uniform(interval: Duration) -> Self {
        Self {
            default_interval: interval,
            ..Self::default()
        }
    }

    /// Override the window for one endpoint.
    pub fn with_interval(mut self, endpoint: Endpoint, interval: Duration) -> Self {
        self.per_endpoint.insert(endpoint, interval);
        self
    }

    pub fn with_cache_failures(mut self, cache_failures: bool) -> Self {
        self.cache_failures = cache_failures;
        self
    }

    /// The refresh window for `endpoint`.
    pub fn interval(&self, endpoint: Endpoint) -> Duration {
        self.per_endpoint
            .get(&endpoint)
            .copied()
            .unwrap_or(self.default_interval)
    }
}

/// Configuration for one router.
///
/// Built by the host, passed to [`Router`](crate::Router) -- core never
/// reads config files.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Router address: bare host, `host:port`, or a full URL.
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Response cache windows.
    pub refresh: RefreshPolicy,
    /// Log in again and retry once when the router rejects the token.
    pub relogin_on_expiry: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            username: DEFAULT_USERNAME.into(),
            password: SecretString::from(String::new()),
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            refresh: RefreshPolicy::default(),
            relogin_on_expiry: true,
        }
    }
}

impl RouterConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            ..Self::default()
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
        }
    }
}
