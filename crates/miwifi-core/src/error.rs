// ── Core error types ──
//
// Domain errors from miwifi-core. Consumers never see HTTP status codes or
// JSON parse failures directly: the `From<miwifi_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to router at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Router session expired")]
    SessionExpired,

    #[error("Router request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unknown reading: {key}")]
    UnknownReading { key: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<miwifi_api::Error> for CoreError {
    fn from(err: miwifi_api::Error) -> Self {
        match err {
            miwifi_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            miwifi_api::Error::NotAuthenticated => CoreError::AuthenticationFailed {
                message: "not logged in".into(),
            },
            miwifi_api::Error::SessionExpired => CoreError::SessionExpired,
            // Timeouts arrive as `Error::Timeout` with the configured value.
            miwifi_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| format!("{}://{}", u.scheme(), u.authority()))
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            miwifi_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid router address: {e}"),
            },
            miwifi_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            miwifi_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            miwifi_api::Error::Http {
                status,
                endpoint,
                preview,
            } => CoreError::Api {
                message: format!("{endpoint}: {preview}"),
                status: Some(status),
            },
            miwifi_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Deserialization error: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_keeps_the_configured_value() {
        let err = CoreError::from(miwifi_api::Error::Timeout { timeout_secs: 7 });
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 7 }), "got: {err:?}");
        assert_eq!(err.to_string(), "Router request timed out after 7s");
    }

    #[test]
    fn shared_failed_login_is_an_auth_failure() {
        let err = CoreError::from(miwifi_api::Error::NotAuthenticated);
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }), "got: {err:?}");
    }
}
