//! NATS implementation of the MessageBroker trait

use async_nats::{Client, ConnectOptions, Subscriber};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::broker::{MessageBroker, MessageStream, ReceivedMessage};
use crate::config::NatsConfig;
use crate::error::MessagingError;

/// NATS-based message broker
#[derive(Clone)]
pub struct NatsBroker {
    client: Client,
}

impl NatsBroker {
    /// Connect using the client name and request timeout from `config`.
    ///
    /// `config.url` may hold a comma-separated server list.
    pub async fn connect(config: &NatsConfig) -> Result<Self, MessagingError> {
        let client = ConnectOptions::new()
            .name(&config.client_name)
            .request_timeout(Some(config.request_timeout))
            .connect(config.url.as_str())
            .await
            .map_err(|e| MessagingError::Connection {
                url: config.url.clone(),
                details: e.to_string(),
            })?;

        info!(url = %config.url, name = %config.client_name, "Connected to NATS");
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Underlying client for advanced operations
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl MessageBroker for NatsBroker {
    async fn publish_raw(&self, subject: &str, payload: Vec<u8>) -> Result<(), MessagingError> {
        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| MessagingError::Publish {
                subject: subject.to_string(),
                details: e.to_string(),
            })
    }

    #[instrument(skip(self, payload), fields(subject = %subject))]
    async fn request_raw(
        &self,
        subject: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, MessagingError> {
        let response = self
            .client
            .request(subject.to_string(), payload.into())
            .await
            .map_err(|e| MessagingError::Request {
                subject: subject.to_string(),
                details: e.to_string(),
            })?;

        debug!(bytes = response.payload.len(), "Received reply");
        Ok(response.payload.to_vec())
    }

    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
    ) -> Result<Box<dyn MessageStream>, MessagingError> {
        let subscriber = self
            .client
            .queue_subscribe(subject.to_string(), queue_group.to_string())
            .await
            .map_err(|e| MessagingError::Subscribe {
                subject: subject.to_string(),
                details: e.to_string(),
            })?;

        Ok(Box::new(NatsMessageStream { subscriber }))
    }

    async fn flush(&self) -> Result<(), MessagingError> {
        self.client
            .flush()
            .await
            .map_err(|e| MessagingError::Flush(e.to_string()))
    }
}

struct NatsMessageStream {
    subscriber: Subscriber,
}

#[async_trait]
impl MessageStream for NatsMessageStream {
    async fn next(&mut self) -> Option<ReceivedMessage> {
        use futures::StreamExt;

        self.subscriber.next().await.map(|msg| ReceivedMessage {
            subject: msg.subject.to_string(),
            payload: msg.payload.to_vec(),
            reply: msg.reply.map(|s| s.to_string()),
        })
    }
}
