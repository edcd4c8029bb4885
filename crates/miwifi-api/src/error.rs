use thiserror::Error;

/// Top-level error type for the `miwifi-api` crate.
///
/// Covers every failure mode of the router's LuCI API surface:
/// authentication, transport, and response decoding.
/// `miwifi-core` maps these into domain diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong password, unexpected response shape, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// An authenticated call was attempted before a successful login.
    #[error("Not authenticated -- call login() first")]
    NotAuthenticated,

    /// The router no longer accepts the stored token.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Router API ──────────────────────────────────────────────────
    /// Non-success HTTP status from an API endpoint.
    #[error("HTTP {status} from {endpoint}: {preview}")]
    Http {
        status: u16,
        endpoint: String,
        preview: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// The body could not be decoded as JSON, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the token has expired
    /// and a fresh login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NotAuthenticated)
    }

    /// Returns `true` if this is a transient error worth polling again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
