// miwifi-api: Async Rust client for the Xiaomi MiWiFi LuCI JSON API

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
mod login;
pub mod transport;

pub use auth::{Credentials, DEFAULT_HOST, DEFAULT_USERNAME};
pub use client::RouterClient;
pub use endpoints::{Endpoint, Identity};
pub use error::Error;
pub use transport::{ResponseBody, TlsMode, Transport, TransportConfig, TransportResponse};
