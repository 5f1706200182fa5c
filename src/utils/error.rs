//! Error types for the feedcast relay
//!
//! This module defines the per-component error taxonomy. Each component
//! returns its own error type; [`crate::error::Error`] unifies them at the
//! module boundary.

use thiserror::Error;

/// Errors that can occur while retrieving the upstream feed
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure, timeout, or non-2xx response
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with an HTML challenge page instead of feed markup
    #[error("Feed request blocked: {0}")]
    Blocked(String),

    /// The payload could not be parsed or lacks the expected structure
    #[error("Malformed feed: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Create a network error from any displayable cause
    pub fn network(cause: impl std::fmt::Display) -> Self {
        Self::Network(cause.to_string())
    }

    /// Create a malformed-feed error with diagnostic detail
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed(detail.into())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Errors returned by the delivery gateway when sending to a destination
#[derive(Error, Debug)]
pub enum SendError {
    /// The destination id could not be resolved, or is no longer reachable
    #[error("Destination unavailable: {0}")]
    DestinationUnavailable(String),

    /// The destination resolved but the send itself failed
    #[error("Transport failure: {0}")]
    TransportFailure(String),
}

/// Errors from the best-effort owner notification side channel
///
/// These are always terminal: callers log them and move on.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// No owner contact is known for the tenant
    #[error("No owner contact configured for tenant {0}")]
    NoOwner(String),

    /// The notification could not be delivered
    #[error("Owner notification failed: {0}")]
    TransportFailure(String),
}

/// Errors from the persistent ledger and tenant store
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    /// The backing file exists but does not hold the expected JSON shape
    #[error("Corrupt store {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

impl StorageError {
    /// Create an I/O error for the given path
    pub fn io(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a corrupt-store error for the given path
    pub fn corrupt(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Precondition failures on tenant configuration changes
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Tag or feature changes require a destination to be set first
    #[error("Tenant {0} has no destination set; set a destination first")]
    NoDestination(String),

    /// Tenant ids must be non-empty
    #[error("Tenant id cannot be empty")]
    EmptyTenantId,

    /// Destination ids must be non-empty
    #[error("Destination id cannot be empty")]
    EmptyDestination,
}

/// Errors from the scheduler configuration and heartbeat
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A window bound is not a valid `HH:MM` time
    #[error("Invalid time '{value}' for {field}: expected HH:MM")]
    InvalidTime { field: String, value: String },

    /// Cadence intervals must be between 1 minute and 1 day
    #[error("Invalid interval for {field}: must be between 1 and 1440 minutes")]
    InvalidInterval { field: String },

    /// Day and night windows must start at different times
    #[error("Day window is empty: day_start and night_start are both {0}")]
    EmptyWindow(String),
}
