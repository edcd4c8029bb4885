// ── Router abstraction ──
//
// One handle per router. Owns the endpoint client and the response cache,
// and evaluates readings through the cache.

use std::str::FromStr;
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use miwifi_api::{Endpoint, Error as ApiError, Identity, RouterClient};

use crate::cache::{EndpointSource, RefreshCache};
use crate::config::RouterConfig;
use crate::error::CoreError;
use crate::reader::{self, DataPath, Scalar};
use crate::readings::{self, READINGS, Reading, ReadingSpec};

// ── SessionSource ────────────────────────────────────────────────

/// Cache source backed by the router session.
///
/// A fetch rejected with an expired session triggers one login and one
/// retry when `relogin` is enabled. Fetches that expire together share
/// that login.
pub struct SessionSource {
    client: Arc<RouterClient>,
    relogin: bool,
}

impl SessionSource {
    pub fn new(client: Arc<RouterClient>, relogin: bool) -> Self {
        Self { client, relogin }
    }

    async fn fetch_with_relogin(&self, endpoint: Endpoint) -> Result<Value, ApiError> {
        let generation = self.client.login_generation();
        match self.client.fetch(endpoint).await {
            Err(ApiError::SessionExpired) if self.relogin => {
                info!(%endpoint, "session expired, logging in again");
                self.client.relogin(generation).await?;
                self.client.fetch(endpoint).await
            }
            other => other,
        }
    }
}

impl EndpointSource for SessionSource {
    fn fetch(&self, endpoint: Endpoint) -> impl Future<Output = Option<Value>> + Send {
        async move {
            match self.fetch_with_relogin(endpoint).await {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(%endpoint, error = %e, "endpoint call failed");
                    None
                }
            }
        }
    }
}

// ── Router ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<RouterInner>`; every clone shares one
/// session and one response cache.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    config: RouterConfig,
    client: Arc<RouterClient>,
    cache: RefreshCache<SessionSource>,
}

impl Router {
    /// Build a router handle with its own HTTP client.
    pub fn new(config: RouterConfig) -> Result<Self, CoreError> {
        let base_url = RouterClient::base_url_for_host(&config.host)?;
        let client = RouterClient::new(base_url, config.credentials(), &config.transport())?;
        Ok(Self::from_client(config, client))
    }

    /// Build a router handle around an existing HTTP client.
    pub fn with_client(config: RouterConfig, http: reqwest::Client) -> Result<Self, CoreError> {
        let base_url = RouterClient::base_url_for_host(&config.host)?;
        let client =
            RouterClient::with_client(http, base_url, config.credentials(), config.timeout);
        Ok(Self::from_client(config, client))
    }

    fn from_client(config: RouterConfig, client: RouterClient) -> Self {
        let client = Arc::new(client);
        let source = SessionSource::new(Arc::clone(&client), config.relogin_on_expiry);
        let cache = RefreshCache::new(source, config.refresh.clone());
        Self {
            inner: Arc::new(RouterInner {
                config,
                client,
                cache,
            }),
        }
    }

    // ── Session ──────────────────────────────────────────────────

    /// Authenticate. Failures are logged and reported as `false`.
    pub async fn login(&self) -> bool {
        self.try_login().await.is_ok()
    }

    /// Authenticate, returning the failure cause.
    pub async fn try_login(&self) -> Result<(), CoreError> {
        self.inner.client.login().await?;
        // Entries stored under the previous session may be failures.
        self.inner.cache.clear();
        debug!(host = %self.host(), "router cache reset after login");
        Ok(())
    }

    pub fn identity(&self) -> Identity {
        self.inner.client.identity()
    }

    /// The endpoint client, one accessor per endpoint.
    pub fn client(&self) -> &RouterClient {
        &self.inner.client
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &RefreshCache<SessionSource> {
        &self.inner.cache
    }

    pub fn host(&self) -> &str {
        self.inner.client.host()
    }

    // ── Cached reads ─────────────────────────────────────────────

    /// The cached payload for `endpoint`, refreshed when stale.
    pub async fn payload(&self, endpoint: Endpoint) -> Option<Arc<Value>> {
        self.inner.cache.get(endpoint).await
    }

    /// Extract one value from a named endpoint through the cache.
    ///
    /// Unknown endpoint names are logged and read as absent.
    pub async fn read(
        &self,
        endpoint_name: &str,
        key_path: &str,
        data_path: Option<DataPath<'_>>,
    ) -> Option<Scalar> {
        let Ok(endpoint) = Endpoint::from_str(endpoint_name) else {
            warn!(endpoint = endpoint_name, "unknown endpoint");
            return None;
        };
        self.read_endpoint(endpoint, key_path, data_path).await
    }

    pub async fn read_endpoint(
        &self,
        endpoint: Endpoint,
        key_path: &str,
        data_path: Option<DataPath<'_>>,
    ) -> Option<Scalar> {
        let payload = self.payload(endpoint).await?;
        reader::extract(&payload, key_path, data_path)
    }

    /// Evaluate one table reading through the cache.
    pub async fn reading(&self, spec: &ReadingSpec) -> Reading {
        let payload = self.payload(spec.endpoint).await;
        spec.evaluate(payload.as_deref())
    }

    /// Evaluate every table reading. Readings sharing an endpoint share one
    /// fetch.
    pub async fn readings(&self) -> Vec<Reading> {
        self.evaluate(READINGS.iter()).await
    }

    /// Evaluate the named readings, in the order given.
    pub async fn readings_for<K: AsRef<str>>(
        &self,
        keys: &[K],
    ) -> Result<Vec<Reading>, CoreError> {
        let specs = keys
            .iter()
            .map(|key| {
                readings::find(key.as_ref()).ok_or_else(|| CoreError::UnknownReading {
                    key: key.as_ref().to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.evaluate(specs.into_iter()).await)
    }

    async fn evaluate(&self, specs: impl Iterator<Item = &ReadingSpec>) -> Vec<Reading> {
        let readings = join_all(specs.map(|spec| self.reading(spec))).await;
        debug!(
            total = readings.len(),
            available = readings.iter().filter(|r| r.available()).count(),
            "readings evaluated"
        );
        readings
    }

    // ── Identifiers ──────────────────────────────────────────────

    /// Stable device identifier: the normalized MAC, or the host when the
    /// MAC is unknown.
    pub fn device_id(&self) -> String {
        self.identity()
            .device_id()
            .unwrap_or_else(|| self.host().to_owned())
    }

    /// Stable identifier for one reading of this router.
    pub fn unique_id(&self, key: &str) -> String {
        format!("{}_{key}", self.device_id())
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("host", &self.host())
            .field("authenticated", &self.inner.client.is_authenticated())
            .finish_non_exhaustive()
    }
}
