//! Fan-out Dispatcher
//!
//! Delivers one message to every eligible tenant of a registry snapshot,
//! sequentially and in registry order. A failing tenant never affects the
//! others:
//!
//! | Step fails          | Outcome                   | Owner notified |
//! |---------------------|---------------------------|----------------|
//! | resolve destination | `DestinationUnavailable`  | no             |
//! | send                | `SendFailed`              | yes, best effort |
//!
//! Owner notification is a side channel: its result is logged and dropped,
//! and never appears in [`TenantOutcome`]. Every gateway call is bounded by
//! the dispatcher's call timeout.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::gateway::DeliveryGateway;
use crate::models::OutgoingMessage;
use crate::registry::TenantRegistry;
use crate::utils::error::SendError;

/// Default bound on a single gateway call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of delivering to one tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The gateway accepted the message
    Delivered,
    /// The destination could not be resolved
    DestinationUnavailable(String),
    /// The destination resolved but the send failed
    SendFailed(String),
}

impl DeliveryStatus {
    /// Short label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::DestinationUnavailable(_) => "destination_unavailable",
            Self::SendFailed(_) => "send_failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => write!(f, "delivered"),
            Self::DestinationUnavailable(reason) => write!(f, "destination unavailable: {reason}"),
            Self::SendFailed(reason) => write!(f, "send failed: {reason}"),
        }
    }
}

/// Per-tenant delivery outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantOutcome {
    pub tenant_id: String,
    pub destination_id: String,
    pub status: DeliveryStatus,
}

impl TenantOutcome {
    /// Whether the message reached this tenant
    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

/// Sends messages to every tenant in a registry snapshot
#[derive(Clone)]
pub struct FanoutDispatcher {
    gateway: Arc<dyn DeliveryGateway>,
    call_timeout: Duration,
}

impl fmt::Debug for FanoutDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutDispatcher")
            .field("gateway", &self.gateway.name())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl FanoutDispatcher {
    /// Create a dispatcher over a gateway
    pub fn new(gateway: Arc<dyn DeliveryGateway>) -> Self {
        Self {
            gateway,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Set the bound applied to each gateway call
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Deliver `message` to each tenant with a destination, in registry order
    ///
    /// Tenant tags are prefixed per tenant. Never fails as a whole; inspect the
    /// returned outcomes for per-tenant results.
    pub async fn dispatch(
        &self,
        message: &OutgoingMessage,
        tenants: &TenantRegistry,
    ) -> Vec<TenantOutcome> {
        let mut outcomes = Vec::with_capacity(tenants.len());

        for (tenant_id, config) in tenants.iter() {
            if !config.has_destination() {
                tracing::debug!(tenant = %tenant_id, "Skipping tenant without destination");
                continue;
            }

            let destination_id = config.destination_id.as_str();
            let status = self
                .deliver(tenant_id, destination_id, &message.tagged(config.tag()))
                .await;

            outcomes.push(TenantOutcome {
                tenant_id: tenant_id.to_string(),
                destination_id: destination_id.to_string(),
                status,
            });
        }

        outcomes
    }

    async fn deliver(
        &self,
        tenant_id: &str,
        destination_id: &str,
        message: &OutgoingMessage,
    ) -> DeliveryStatus {
        let handle = match self
            .bounded(self.gateway.resolve_destination(destination_id))
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(
                    tenant = %tenant_id,
                    destination = %destination_id,
                    error = %e,
                    "Destination not found"
                );
                return DeliveryStatus::DestinationUnavailable(e.to_string());
            }
        };

        match self.bounded(self.gateway.send(&handle, message)).await {
            Ok(()) => {
                tracing::info!(tenant = %tenant_id, destination = %handle, "Delivered");
                DeliveryStatus::Delivered
            }
            Err(e) => {
                tracing::error!(
                    tenant = %tenant_id,
                    destination = %handle,
                    error = %e,
                    "Could not send to destination"
                );
                self.notify_owner(
                    tenant_id,
                    &format!("Could not deliver news to destination {handle}: {e}"),
                )
                .await;
                DeliveryStatus::SendFailed(e.to_string())
            }
        }
    }

    /// Best-effort owner notification; failures are logged and dropped
    async fn notify_owner(&self, tenant_id: &str, text: &str) {
        match tokio::time::timeout(
            self.call_timeout,
            self.gateway.notify_owner(tenant_id, text),
        )
        .await
        {
            Ok(Ok(())) => tracing::info!(tenant = %tenant_id, "Owner notified of delivery failure"),
            Ok(Err(e)) => tracing::warn!(tenant = %tenant_id, error = %e, "Owner notification failed"),
            Err(_) => tracing::warn!(tenant = %tenant_id, "Owner notification timed out"),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, SendError>>,
    ) -> Result<T, SendError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SendError::TransportFailure(format!(
                "gateway call timed out after {:?}",
                self.call_timeout
            ))),
        }
    }
}
