//! Queue-group command server.
//!
//! Every command a [`CommandHandler`] declares gets its own queue
//! subscription. Each inbound request runs on its own task, bounded by a
//! shared semaphore, and its reply goes to the request's reply subject.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::broker::{MessageBroker, MessageStream, ReceivedMessage};
use crate::config::NatsConfig;
use crate::envelope::{command_subject, CommandEnvelope, ReplyEnvelope};
use crate::error::{MessagingError, RpcError};

/// Routes a command name plus JSON payload to business logic
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Command names this handler answers
    fn commands(&self) -> &'static [&'static str];

    async fn handle(&self, command: &str, data: Value) -> Result<Value, RpcError>;
}

pub struct CommandServer<B: MessageBroker + ?Sized, H: CommandHandler> {
    broker: Arc<B>,
    handler: Arc<H>,
    queue_group: String,
    limiter: Arc<Semaphore>,
}

impl<B, H> CommandServer<B, H>
where
    B: MessageBroker + ?Sized + 'static,
    H: CommandHandler,
{
    pub fn new(broker: Arc<B>, handler: Arc<H>, config: &NatsConfig) -> Self {
        Self {
            broker,
            handler,
            queue_group: config.queue_group.clone(),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
        }
    }

    /// Serve until `shutdown_rx` flips to `true` (or its sender is dropped).
    ///
    /// Returns after every in-flight handler has finished and replied.
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) -> Result<(), MessagingError> {
        let mut listeners = JoinSet::new();

        for command in self.handler.commands() {
            let subject = command_subject(command);
            let stream = self
                .broker
                .queue_subscribe(&subject, &self.queue_group)
                .await?;

            debug!(subject = %subject, queue_group = %self.queue_group, "Subscribed");

            listeners.spawn(listen(
                subject,
                stream,
                self.broker.clone(),
                self.handler.clone(),
                self.limiter.clone(),
                shutdown_rx.clone(),
            ));
        }

        info!(
            commands = self.handler.commands().len(),
            queue_group = %self.queue_group,
            "Command server started"
        );

        while let Some(result) = listeners.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Listener task panicked");
            }
        }

        info!("Command server stopped");
        Ok(())
    }
}

async fn listen<B, H>(
    subject: String,
    mut stream: Box<dyn MessageStream>,
    broker: Arc<B>,
    handler: Arc<H>,
    limiter: Arc<Semaphore>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    B: MessageBroker + ?Sized + 'static,
    H: CommandHandler,
{
    let mut in_flight = JoinSet::new();

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!(subject = %subject, "Shutdown signal received");
                    break;
                }
            }

            message = stream.next() => {
                let Some(message) = message else {
                    warn!(subject = %subject, "Subscription closed");
                    break;
                };

                let permit = tokio::select! {
                    permit = limiter.clone().acquire_owned() => permit.ok(),
                    _ = shutdown_requested(&mut shutdown_rx) => None,
                };
                let stopping = permit.is_none();
                let broker = broker.clone();
                let handler = handler.clone();

                // Without a permit the message still runs, as part of the drain.
                in_flight.spawn(async move {
                    respond(broker.as_ref(), handler.as_ref(), message).await;
                    drop(permit);
                });

                if stopping {
                    debug!(subject = %subject, "Shutdown signal received while at capacity");
                    break;
                }
            }
        }

        while let Some(result) = in_flight.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "Handler task panicked");
            }
        }
    }

    // Unsubscribe before draining so no new work arrives.
    drop(stream);

    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "Handler task panicked");
        }
    }
}

/// Resolves once shutdown is requested or the sender is gone
async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

/// Handle one message and publish the reply, if the sender asked for one
async fn respond<B, H>(broker: &B, handler: &H, message: ReceivedMessage)
where
    B: MessageBroker + ?Sized,
    H: CommandHandler,
{
    let reply = dispatch(handler, &message).await;

    let Some(reply_subject) = message.reply else {
        if let Some(err) = &reply.err {
            warn!(subject = %message.subject, status = err.status, error = %err, "Dropping error for message without reply subject");
        }
        return;
    };

    let payload = match serde_json::to_vec(&reply) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "Failed to serialize reply");
            return;
        }
    };

    if let Err(e) = broker.publish_raw(&reply_subject, payload).await {
        error!(error = %e, "Failed to publish reply");
    }
}

/// Decode the envelope, route it and build the reply
pub(crate) async fn dispatch<H: CommandHandler>(
    handler: &H,
    message: &ReceivedMessage,
) -> ReplyEnvelope {
    let envelope: CommandEnvelope = match message.parse() {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(subject = %message.subject, error = %e, "Malformed command envelope");
            return ReplyEnvelope::failure(
                None,
                RpcError::bad_request(format!("Malformed command envelope: {e}")),
            );
        }
    };

    let command = match envelope.command() {
        Some(command) if handler.commands().iter().any(|known| *known == command) => {
            command.to_string()
        }
        _ => {
            warn!(pattern = %envelope.pattern, "No handler for pattern");
            return ReplyEnvelope::failure(envelope.id, RpcError::no_handler());
        }
    };

    handle_command(handler, &command, envelope.id, envelope.data).await
}

#[instrument(skip(handler, data), fields(request_id = request_id.as_deref().unwrap_or("-")))]
async fn handle_command<H: CommandHandler>(
    handler: &H,
    command: &str,
    request_id: Option<String>,
    data: Value,
) -> ReplyEnvelope {
    match handler.handle(command, data).await {
        Ok(response) => {
            debug!("Command handled");
            ReplyEnvelope::success(request_id, response)
        }
        Err(err) => {
            if err.is_client_error() {
                debug!(status = err.status, error = %err, "Command rejected");
            } else {
                error!(status = err.status, error = %err, "Command failed");
            }
            ReplyEnvelope::failure(request_id, err)
        }
    }
}
