// Router session client
//
// Wraps the transport with LuCI URL construction and token storage. Login
// lives in `login.rs`, the per-endpoint accessors in `endpoints.rs`; this
// module stays focused on session mechanics and the authenticated GET.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::endpoints::Identity;
use crate::error::{Error, preview};
use crate::transport::{ResponseBody, Transport, TransportConfig};

/// LuCI root shared by every API path.
const LUCI_ROOT: &str = "cgi-bin/luci";

/// Error code the router embeds in an HTTP 200 body when the token is stale.
const INVALID_TOKEN_CODE: i64 = 401;

/// Authenticated HTTP client for one MiWiFi router.
///
/// Holds the credentials supplied at construction and the session token
/// (`stok`) issued by the last successful login. Every authenticated request
/// embeds the token in the URL path as `;stok={token}`.
pub struct RouterClient {
    transport: Transport,
    base_url: Url,
    credentials: Credentials,
    /// Session token. `None` until the first successful login; cleared
    /// again when a later login is rejected.
    token: RwLock<Option<SecretString>>,
    /// Serializes logins so concurrent callers share one attempt.
    pub(crate) login_gate: tokio::sync::Mutex<()>,
    /// Completed login attempts, successful or not.
    pub(crate) login_attempts: AtomicU64,
    /// Identity derived after the first successful login.
    pub(crate) identity: OnceLock<Identity>,
}

impl RouterClient {
    /// Create a client that builds its own `reqwest::Client` from `transport`.
    ///
    /// `base_url` is the router root, e.g. `https://192.168.31.1`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self::from_transport(
            Transport::new(transport)?,
            base_url,
            credentials,
        ))
    }

    /// Create a client around a shared, caller-managed `reqwest::Client`.
    ///
    /// `timeout` is applied per request, so it holds even when `http` was
    /// built without one.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        timeout: Duration,
    ) -> Self {
        Self::from_transport(Transport::with_client(http, timeout), base_url, credentials)
    }

    fn from_transport(transport: Transport, base_url: Url, credentials: Credentials) -> Self {
        Self {
            transport,
            base_url,
            credentials,
            token: RwLock::new(None),
            login_gate: tokio::sync::Mutex::new(()),
            login_attempts: AtomicU64::new(0),
            identity: OnceLock::new(),
        }
    }

    /// The `https://{host}` root URL for a bare host or `host:port`.
    pub fn base_url_for_host(host: &str) -> Result<Url, Error> {
        let host = host.trim().trim_end_matches('/');
        if host.contains("://") {
            return Ok(Url::parse(host)?);
        }
        Ok(Url::parse(&format!("https://{host}"))?)
    }

    /// The router base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The host portion of the base URL.
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    // ── Session token ────────────────────────────────────────────────

    /// Whether a session token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn set_token(&self, token: String) {
        debug!("storing session token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SecretString::from(token));
    }

    pub(crate) fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The current token, if any. Exposed for callers that build their own
    /// URLs; never log the returned value.
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of login attempts completed so far.
    ///
    /// Snapshot this before a request; pass it to
    /// [`relogin`](Self::relogin) if the request reports an expired session.
    pub fn login_generation(&self) -> u64 {
        self.login_attempts.load(Ordering::Acquire)
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn root(&self) -> String {
        format!("{}/{LUCI_ROOT}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Unauthenticated API URL: `{base}/cgi-bin/luci/api/{path}`.
    pub(crate) fn public_url(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}/api/{path}", self.root()))?)
    }

    /// Token-scoped API URL: `{base}/cgi-bin/luci/;stok={token}/api/{path}`.
    pub(crate) fn stok_url(&self, token: &SecretString, path: &str) -> Result<Url, Error> {
        let full = format!("{}/;stok={}/api/{path}", self.root(), token.expose_secret());
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET an authenticated endpoint and return its JSON body.
    ///
    /// Fails fast with [`Error::NotAuthenticated`] (no network call) when no
    /// token is held. HTTP 401/403, or a `{"code": 401}` body, map to
    /// [`Error::SessionExpired`].
    pub async fn authenticated_get(&self, path: &str) -> Result<Value, Error> {
        let token = self.token().ok_or(Error::NotAuthenticated)?;
        let url = self.stok_url(&token, path)?;

        // The URL embeds the token; log the endpoint path only.
        debug!(endpoint = path, "GET");

        let resp = self
            .transport
            .request(Method::GET, url, HeaderMap::new(), None)
            .await?;

        match resp.status {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(Error::SessionExpired),
            status => {
                return Err(Error::Http {
                    status: status.as_u16(),
                    endpoint: path.to_owned(),
                    preview: preview(&resp.body.to_text()),
                });
            }
        }

        match resp.body {
            ResponseBody::Json(value) => {
                if value.get("code").and_then(Value::as_i64) == Some(INVALID_TOKEN_CODE) {
                    trace!(endpoint = path, "router rejected token");
                    return Err(Error::SessionExpired);
                }
                Ok(value)
            }
            ResponseBody::Text(body) => Err(Error::Deserialization {
                message: format!("{path} returned a non-JSON body: {}", preview(&body)),
                body,
            }),
        }
    }
}

impl std::fmt::Debug for RouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.credentials.username)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
