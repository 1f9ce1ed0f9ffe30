//! Error types for the dynamic DNS updater
//!
//! Every collaborator maps its own failures into this closed set of kinds so
//! the reconciler can decide fatal-vs-continue without knowing which HTTP
//! client or DNS SDK produced them.

use thiserror::Error;

/// Result type alias for dynamic DNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dynamic DNS updater
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Network/HTTP failure reaching the echo service or the provider API
    #[error("transport error: {0}")]
    Transport(String),

    /// A value expected to be an IP address literal failed to parse
    #[error("{0}")]
    Validation(String),

    /// The provider answered, but the configured zone/name matched nothing usable
    #[error("{0}")]
    Lookup(String),

    /// The provider rejected a request with its own error code
    #[error("{provider} error: code: {code}, message: {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Provider-specific error code (e.g. `NoSuchHostedZone`)
        code: String,
        /// Provider-supplied message
        message: String,
    },

    /// Push notification could not be delivered
    #[error("notification error: {0}")]
    Notification(String),

    /// Startup configuration is missing or malformed
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Provider error code, if this is a provider error
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Self::Provider { code, .. } => Some(code),
            _ => None,
        }
    }
}
