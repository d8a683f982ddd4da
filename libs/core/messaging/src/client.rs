use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::broker::MessageBroker;
use crate::envelope::{command_subject, CommandEnvelope, ReplyEnvelope};
use crate::error::MessagingError;

/// Caller side of the command protocol.
///
/// Wraps `data` in a [`CommandEnvelope`], waits for the reply and decodes the
/// `response`. An `err` reply surfaces as [`MessagingError::Remote`].
pub struct CommandClient<B: MessageBroker + ?Sized> {
    broker: Arc<B>,
}

impl<B: MessageBroker + ?Sized> Clone for CommandClient<B> {
    fn clone(&self) -> Self {
        Self {
            broker: self.broker.clone(),
        }
    }
}

impl<B: MessageBroker + ?Sized> CommandClient<B> {
    pub fn new(broker: Arc<B>) -> Self {
        Self { broker }
    }

    #[instrument(skip(self, data))]
    pub async fn send<T, R>(&self, command: &str, data: &T) -> Result<R, MessagingError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let envelope = CommandEnvelope::new(command, serde_json::to_value(data)?);
        let payload = serde_json::to_vec(&envelope)?;

        let bytes = self
            .broker
            .request_raw(&command_subject(command), payload)
            .await?;

        let reply: ReplyEnvelope = serde_json::from_slice(&bytes)?;
        let response = reply.into_result().map_err(MessagingError::Remote)?;
        Ok(serde_json::from_value(response)?)
    }
}
