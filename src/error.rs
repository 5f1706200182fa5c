//! Unified error handling for the feedcast crate
//!
//! This module provides a unified error type that consolidates all
//! component errors into a single `Error` enum, while keeping the
//! component-specific errors available where callers need to match on them.
//!
//! # Architecture
//!
//! - [`FeedcastErrorTrait`] - Common interface implemented by the unified error
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all component errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use feedcast::error::{Error, FeedcastErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(error = %err, "Cycle aborted; next tick will retry");
//!     } else {
//!         tracing::error!(error = %err, "Operator attention required");
//!     }
//! }
//! ```

use thiserror::Error;

pub use crate::utils::error::{
    FetchError, NotifyError, RegistryError, SchedulerError, SendError, StorageError,
};

/// Common trait for feedcast error types
pub trait FeedcastErrorTrait: std::error::Error {
    /// Check if this error is transient (the next poll cycle may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Upstream feed or HTTP errors
    Network,
    /// Feed structure errors
    Parsing,
    /// Delivery gateway errors
    Delivery,
    /// Ledger and tenant store errors
    Storage,
    /// Configuration and precondition errors
    Config,
    /// Scheduler and timing errors
    Scheduler,
}

impl ErrorCategory {
    /// Get a short label for the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Delivery => "delivery",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Scheduler => "scheduler",
        }
    }
}

/// Unified error type for the feedcast crate
#[derive(Error, Debug)]
pub enum Error {
    /// Feed retrieval errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Delivery errors
    #[error("Send error: {0}")]
    Send(#[from] SendError),

    /// Owner notification errors
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// Ledger and tenant store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Tenant configuration precondition failures
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FeedcastErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(_) => true,
            Self::Send(_) | Self::Notify(_) => true,
            Self::Storage(StorageError::Io { .. }) => true,
            Self::Storage(StorageError::Corrupt { .. }) => false,
            Self::Registry(_) => false,
            Self::Scheduler(_) => false,
            Self::Http(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::Malformed(_)) => ErrorCategory::Parsing,
            Self::Fetch(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Send(_) | Self::Notify(_) => ErrorCategory::Delivery,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Registry(_) => ErrorCategory::Config,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(FetchError::Network("timeout".to_string()));
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let malformed = Error::Fetch(FetchError::malformed("missing <rss>"));
        assert_eq!(malformed.category(), ErrorCategory::Parsing);

        let send_err = Error::Send(SendError::TransportFailure("500".to_string()));
        assert_eq!(send_err.category(), ErrorCategory::Delivery);
    }

    #[test]
    fn test_is_recoverable() {
        let blocked = Error::Fetch(FetchError::Blocked("cloudflare".to_string()));
        assert!(blocked.is_recoverable());

        let registry = Error::Registry(RegistryError::NoDestination("g1".to_string()));
        assert!(!registry.is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let unified: Error = RegistryError::EmptyTenantId.into();
        assert!(matches!(unified, Error::Registry(_)));

        let unified: Error = StorageError::corrupt("x.json", "not an object").into();
        assert_eq!(unified.category(), ErrorCategory::Storage);
        assert!(!unified.is_recoverable());
    }
}
