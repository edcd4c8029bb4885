// ── Per-endpoint response cache ──
//
// One slot per endpoint. A slot holds the last stored response and, while a
// refresh runs, a shared handle to that refresh. Slot locks are plain
// `std::sync::Mutex`es and are only ever held for a few field reads and
// writes, never across an `.await`.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use miwifi_api::Endpoint;

use crate::config::RefreshPolicy;

type PendingFetch = Shared<BoxFuture<'static, Option<Arc<Value>>>>;

/// Where the cache gets fresh payloads from.
///
/// `None` means the fetch failed; the source is expected to have logged why.
pub trait EndpointSource: Send + Sync + 'static {
    fn fetch(&self, endpoint: Endpoint) -> impl Future<Output = Option<Value>> + Send;
}

/// A stored endpoint response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub endpoint: Endpoint,
    /// `None` records a failed fetch.
    pub payload: Option<Arc<Value>>,
    pub fetched_at: Instant,
}

impl CachedResponse {
    fn is_fresh(&self, now: Instant, policy: &RefreshPolicy) -> bool {
        now.saturating_duration_since(self.fetched_at) <= policy.interval(self.endpoint)
    }
}

#[derive(Default)]
struct Slot {
    cached: Option<CachedResponse>,
    in_flight: Option<PendingFetch>,
}

fn lock(slot: &Mutex<Slot>) -> std::sync::MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coalescing response cache in front of an [`EndpointSource`].
pub struct RefreshCache<S> {
    source: Arc<S>,
    policy: RefreshPolicy,
    slots: DashMap<Endpoint, Arc<Mutex<Slot>>>,
}

impl<S: EndpointSource> RefreshCache<S> {
    pub fn new(source: S, policy: RefreshPolicy) -> Self {
        Self::with_shared_source(Arc::new(source), policy)
    }

    pub fn with_shared_source(source: Arc<S>, policy: RefreshPolicy) -> Self {
        Self {
            source,
            policy,
            slots: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// The payload for `endpoint`, refreshing it first when the stored entry
    /// is missing or older than the endpoint's interval.
    ///
    /// Concurrent callers for the same endpoint share one fetch. The fetch
    /// runs as its own task, so dropping the returned future does not stop
    /// the cache from being populated.
    pub async fn get(&self, endpoint: Endpoint) -> Option<Arc<Value>> {
        let slot = self.slot(endpoint);

        let pending = {
            let mut guard = lock(&slot);
            let now = Instant::now();

            if let Some(cached) = guard
                .cached
                .as_ref()
                .filter(|cached| cached.is_fresh(now, &self.policy))
            {
                trace!(%endpoint, "cache hit");
                return cached.payload.clone();
            }

            if let Some(in_flight) = guard.in_flight.as_ref() {
                trace!(%endpoint, "joining in-flight refresh");
                in_flight.clone()
            } else {
                let pending = self.spawn_refresh(endpoint, Arc::clone(&slot), now);
                guard.in_flight = Some(pending.clone());
                pending
            }
        };

        pending.await
    }

    /// Start a refresh task. Must be called with the slot lock held so the
    /// task cannot clear `in_flight` before the caller has set it.
    fn spawn_refresh(
        &self,
        endpoint: Endpoint,
        slot: Arc<Mutex<Slot>>,
        now: Instant,
    ) -> PendingFetch {
        let source = Arc::clone(&self.source);
        let cache_failures = self.policy.cache_failures;
        let task_slot = Arc::clone(&slot);

        debug!(%endpoint, "refreshing");
        let handle = tokio::spawn(async move {
            let payload = source.fetch(endpoint).await.map(Arc::new);

            let mut guard = lock(&task_slot);
            if payload.is_some() || cache_failures {
                guard.cached = Some(CachedResponse {
                    endpoint,
                    payload: payload.clone(),
                    fetched_at: now,
                });
            }
            guard.in_flight = None;
            payload
        });

        handle
            .map(move |joined| match joined {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(%endpoint, error = %e, "refresh task failed");
                    lock(&slot).in_flight = None;
                    None
                }
            })
            .boxed()
            .shared()
    }

    /// The stored entry for `endpoint`, without fetching.
    pub fn snapshot(&self, endpoint: Endpoint) -> Option<CachedResponse> {
        let slot = self.slots.get(&endpoint)?;
        lock(slot.value()).cached.clone()
    }

    /// Every stored entry, ordered by endpoint.
    pub fn entries(&self) -> Vec<CachedResponse> {
        let mut entries: Vec<_> = self
            .slots
            .iter()
            .filter_map(|slot| lock(slot.value()).cached.clone())
            .collect();
        entries.sort_by_key(|entry| entry.endpoint);
        entries
    }

    /// Whether `endpoint` has an entry inside its refresh window.
    pub fn is_fresh(&self, endpoint: Endpoint) -> bool {
        let now = Instant::now();
        self.snapshot(endpoint)
            .is_some_and(|cached| cached.is_fresh(now, &self.policy))
    }

    /// Drop the stored entry for `endpoint`. An in-flight refresh still
    /// completes and stores its result.
    pub fn invalidate(&self, endpoint: Endpoint) {
        if let Some(slot) = self.slots.get(&endpoint) {
            lock(slot.value()).cached = None;
        }
    }

    /// Drop every stored entry.
    pub fn clear(&self) {
        for slot in &self.slots {
            lock(slot.value()).cached = None;
        }
    }

    fn slot(&self, endpoint: Endpoint) -> Arc<Mutex<Slot>> {
        Arc::clone(self.slots.entry(endpoint).or_default().value())
    }
}
