//! Cached polling layer between `miwifi-api` and its consumers.
//!
//! - **[`Router`]**: one cheaply cloneable handle per router. Logs in,
//!   exposes the identity snapshot, and evaluates readings through the
//!   response cache.
//!
//! - **[`RefreshCache`]**: per-endpoint response cache. Concurrent callers
//!   for the same endpoint share one fetch; each endpoint has its own
//!   refresh window.
//!
//! - **Field reader** ([`reader`]): dotted key path plus an optional key or
//!   index, yielding a displayable [`Scalar`].
//!
//! - **Reading table** ([`READINGS`]): every known router reading as data,
//!   evaluated by one generic routine.

pub mod cache;
pub mod config;
pub mod error;
pub mod reader;
pub mod readings;
pub mod router;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CachedResponse, EndpointSource, RefreshCache};
pub use config::{DEFAULT_REFRESH_INTERVAL, RefreshPolicy, RouterConfig, TlsVerification};
pub use error::CoreError;
pub use reader::{DataPath, Scalar};
pub use readings::{Coercion, READINGS, Reading, ReadingSpec, ReadingValue};
pub use router::{Router, SessionSource};

// Transport-level types consumers commonly need.
pub use miwifi_api::{Endpoint, Identity, RouterClient};
