//! Error types for command messaging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body carried in a reply's `err` field.
///
/// `status` follows HTTP semantics so gateways can forward it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct RpcError {
    pub status: u16,
    pub message: String,
}

impl RpcError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// Reply for a pattern no handler is registered for
    pub fn no_handler() -> Self {
        Self::bad_request("There is no matching message handler defined in the remote service.")
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Transport-level failures
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("failed to connect to NATS at {url}: {details}")]
    Connection { url: String, details: String },

    #[error("failed to subscribe to {subject}: {details}")]
    Subscribe { subject: String, details: String },

    #[error("failed to publish to {subject}: {details}")]
    Publish { subject: String, details: String },

    #[error("request to {subject} failed: {details}")]
    Request { subject: String, details: String },

    #[error("flush failed: {0}")]
    Flush(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote handler answered with an error reply
    #[error("remote error ({}): {}", .0.status, .0.message)]
    Remote(RpcError),
}

impl MessagingError {
    /// Remote error body, when the failure came from the handler
    pub fn as_remote(&self) -> Option<&RpcError> {
        match self {
            MessagingError::Remote(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_constructors() {
        assert_eq!(RpcError::bad_request("x").status, 400);
        assert_eq!(RpcError::not_found("x").status, 404);
        assert_eq!(RpcError::internal("x").status, 500);
        assert!(RpcError::not_found("x").is_client_error());
        assert!(!RpcError::internal("x").is_client_error());
    }

    #[test]
    fn test_rpc_error_display_is_message() {
        let err = RpcError::not_found("Product with id 9 not found");
        assert_eq!(err.to_string(), "Product with id 9 not found");
    }

    #[test]
    fn test_remote_error_display() {
        let err = MessagingError::Remote(RpcError::bad_request("bad"));
        assert_eq!(err.to_string(), "remote error (400): bad");
        assert_eq!(err.as_remote().map(|e| e.status), Some(400));
    }
}
