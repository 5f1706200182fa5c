//! Delivery to tenant destinations
//!
//! - [`gateway`] - the [`DeliveryGateway`] collaborator interface
//! - [`webhook`] - webhook implementation used by the binary
//! - [`dispatcher`] - per-entry fan-out with failure isolation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use feedcast::delivery::{FanoutDispatcher, WebhookGateway};
//!
//! let gateway = WebhookGateway::new(&config.delivery)?;
//! let dispatcher = FanoutDispatcher::new(Arc::new(gateway))
//!     .with_call_timeout(config.delivery.timeout());
//! let outcomes = dispatcher.dispatch(&message, &registry).await;
//! ```

pub mod dispatcher;
pub mod gateway;
pub mod webhook;

pub use dispatcher::{DeliveryStatus, FanoutDispatcher, TenantOutcome};
pub use gateway::{DeliveryGateway, DestinationHandle};
pub use webhook::WebhookGateway;
