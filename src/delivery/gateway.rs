//! Delivery Gateway interface
//!
//! The gateway owns everything platform-specific: how a destination id maps to
//! an endpoint, how a renderable is displayed, and how a tenant's owner is
//! reached. The dispatcher only sees this trait.

use async_trait::async_trait;
use std::fmt;

use crate::models::OutgoingMessage;
use crate::utils::error::{NotifyError, SendError};

/// A resolved destination, valid for the remainder of one cycle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationHandle {
    /// Destination id as configured on the tenant
    pub id: String,

    /// Gateway-specific endpoint (e.g. a webhook URL)
    pub endpoint: String,
}

impl DestinationHandle {
    /// Create a handle
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Display for DestinationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Platform adapter used by the fan-out dispatcher
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Gateway name for logs
    fn name(&self) -> &str;

    /// Resolve a destination id to a handle
    ///
    /// Unknown or inaccessible destinations yield [`SendError::DestinationUnavailable`].
    async fn resolve_destination(&self, destination_id: &str)
        -> Result<DestinationHandle, SendError>;

    /// Deliver one message to a resolved destination
    async fn send(
        &self,
        destination: &DestinationHandle,
        message: &OutgoingMessage,
    ) -> Result<(), SendError>;

    /// Best-effort message to the owner of a tenant
    async fn notify_owner(&self, tenant_id: &str, message: &str) -> Result<(), NotifyError>;
}
