//! Resilient backend access for the punch clock client.
//!
//! Discovers which candidate base URL is reachable, fails over between bases
//! per request, and reconciles the offline punch queue once the backend is
//! back.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod resolver;
pub mod runtime;
pub mod sync;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::ResilientClient;
pub use config::{override_from_launch_url, ConnectConfig, DEFAULT_API_CANDIDATES};
pub use endpoint::EndpointState;
pub use error::{ApiRetryClass, ConnectError, Result};
pub use fetch::fetch_with_timeout;
pub use resolver::EndpointResolver;
pub use runtime::PunchClock;
pub use sync::sync_offline_queue;
pub use types::*;
