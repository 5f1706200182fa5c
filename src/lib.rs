//! feedcast - Scheduled news feed relay
//!
//! Polls an RSS news feed on a day/night cadence, extracts entries that have
//! not been delivered before, and fans each one out to every configured
//! tenant destination. Delivery history survives restarts so nothing is
//! delivered twice.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`feed`] - Feed fetching, XML parsing and entry normalization
//! - [`models`] - Core data structures and types
//! - [`registry`] - Tenant lookup and administrative updates
//! - [`delivery`] - Delivery gateway and per-tenant fan-out
//! - [`relay`] - One poll cycle: fetch, diff, deliver, record
//! - [`scheduler`] - Adaptive cadence and heartbeat loop
//! - [`storage`] - JSON persistence for the ledger and tenant store
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use feedcast::config::Config;
//! use feedcast::relay::Relay;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let relay = Relay::from_config(&config).await?;
//!     let report = relay.run_cycle().await?;
//!     println!("{} new entries", report.new_entries);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod delivery;
pub mod error;
pub mod feed;
pub mod models;
pub mod registry;
pub mod relay;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::delivery::{DeliveryGateway, DeliveryStatus, FanoutDispatcher, TenantOutcome};
    pub use crate::error::{Error, ErrorCategory, FeedcastErrorTrait, Result};
    pub use crate::feed::{FeedFetcher, FeedParser, RssParser};
    pub use crate::models::{FeedDocument, FeedEntry, NewEntry, OutgoingMessage, TenantConfig};
    pub use crate::registry::TenantRegistry;
    pub use crate::relay::{CycleReport, Relay};
    pub use crate::scheduler::{CadencePolicy, HeartbeatScheduler};
    pub use crate::storage::{DeliveryLedger, TenantStore};
}

// Direct re-exports for convenience
pub use models::{FeedEntry, NewEntry, OutgoingMessage, TenantConfig};
