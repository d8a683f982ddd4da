//! Broker abstraction so the server loop can run against NATS or a test double.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::MessagingError;

/// Received message with metadata
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Subject the message was received on
    pub subject: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
    /// Reply subject for request-reply
    pub reply: Option<String>,
}

impl ReceivedMessage {
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, MessagingError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

/// Minimal broker surface needed for command request/reply
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish raw bytes to a subject
    async fn publish_raw(&self, subject: &str, payload: Vec<u8>) -> Result<(), MessagingError>;

    /// Send a request and wait for the first reply
    async fn request_raw(&self, subject: &str, payload: Vec<u8>)
        -> Result<Vec<u8>, MessagingError>;

    /// Load-balanced subscription shared by every member of `queue_group`
    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
    ) -> Result<Box<dyn MessageStream>, MessagingError>;

    /// Flush buffered outbound messages
    async fn flush(&self) -> Result<(), MessagingError>;
}

/// Stream of incoming messages
#[async_trait]
pub trait MessageStream: Send + Sync {
    /// Receive the next message; `None` once the subscription is closed
    async fn next(&mut self) -> Option<ReceivedMessage>;
}
