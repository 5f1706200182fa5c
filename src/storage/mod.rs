//! Persistent state for the relay
//!
//! Three JSON documents survive restarts:
//!
//! | Store               | Shape                                  | Default path                 |
//! |---------------------|----------------------------------------|------------------------------|
//! | Delivery ledger     | `identity -> {title, link}`            | `data/posted_news.json`      |
//! | Secondary ledger    | `[id, ...]`                            | `data/posted_secondary.json` |
//! | Tenant configuration| `tenant id -> {destination_id, tag, features}` | `data/tenants.json`  |
//!
//! All writes are atomic (temp file + rename) and serialized per store.
//!
//! # Example
//!
//! ```ignore
//! use feedcast::storage::{DeliveryLedger, TenantStore};
//!
//! let ledger = DeliveryLedger::open("data/posted_news.json").await?;
//! let tenants = TenantStore::new("data/tenants.json").load().await?;
//! ```

pub mod json;
pub mod ledger;
pub mod tenants;

pub use ledger::{DeliveryLedger, SeenIdLedger};
pub use tenants::{TenantMap, TenantStore};
