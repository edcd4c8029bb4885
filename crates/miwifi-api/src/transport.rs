// Transport layer: reqwest client construction and tolerant response decoding.
//
// MiWiFi firmware serves self-signed certificates and frequently labels JSON
// responses as `text/html`, so TLS policy is explicit and bodies are always
// decoded from text rather than trusting the declared content type.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("miwifi/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate and hostname (self-signed LAN routers).
    #[default]
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                // With rustls this also disables hostname verification.
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Response body ───────────────────────────────────────────────────

/// A decoded response body: JSON when the text parses, opaque text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Decode a body, preferring JSON regardless of the declared content type.
    pub fn decode(text: String, content_type: Option<&str>) -> Self {
        let declared_json = content_type.is_some_and(|ct| ct.contains("json"));
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                if !declared_json {
                    trace!(?content_type, "parsed JSON from non-JSON content type");
                }
                Self::Json(value)
            }
            Err(e) => {
                if declared_json {
                    debug!(error = %e, "body declared as JSON failed to parse");
                }
                Self::Text(text)
            }
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// The body rendered back to text (for previews in error messages).
    pub fn to_text(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Status code plus decoded body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: ResponseBody,
}

// ── Transport ───────────────────────────────────────────────────────

/// Thin request executor over a `reqwest::Client`. No retries.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    timeout: Duration,
}

impl Transport {
    /// Build a transport with a fresh client from `config`.
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
            timeout: config.timeout,
        })
    }

    /// Wrap an existing, caller-managed client. `timeout` bounds every
    /// request regardless of how `http` was built.
    pub fn with_client(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Issue one request and decode the body.
    ///
    /// `form` is sent as `application/x-www-form-urlencoded` when present.
    pub async fn request(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        form: Option<&[(&str, &str)]>,
    ) -> Result<TransportResponse, Error> {
        let mut builder = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .headers(headers)
            .timeout(self.timeout);
        if let Some(form) = form {
            builder = builder.form(form);
        }

        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        let text = resp.text().await.map_err(|e| self.map_send_error(e))?;

        trace!(%status, len = text.len(), "response received");
        Ok(TransportResponse {
            status,
            body: ResponseBody::decode(text, content_type.as_deref()),
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_json_served_as_html() {
        let body = ResponseBody::decode(r#"{"code":0}"#.into(), Some("text/html; charset=utf-8"));
        assert_eq!(body, ResponseBody::Json(json!({ "code": 0 })));
    }

    #[test]
    fn keeps_unparsable_body_as_text() {
        let body = ResponseBody::decode("<html>busy</html>".into(), Some("text/html"));
        assert_eq!(body.as_json(), None);
        assert_eq!(body.to_text(), "<html>busy</html>");
    }

    #[test]
    fn declared_json_that_fails_is_text() {
        let body = ResponseBody::decode("{not json".into(), Some("application/json"));
        assert!(matches!(body, ResponseBody::Text(_)));
    }
}
