//! Command/reply messaging for services reached over an internal broker.
//!
//! A caller publishes a [`CommandEnvelope`] on the subject derived from a
//! command pattern (`{"cmd":"create_product"}`) and waits for a single
//! [`ReplyEnvelope`] carrying either a `response` or an `err`. The wire
//! format matches the Nest microservices NATS transport, so Rust services can
//! sit behind existing Node gateways.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  request   ┌──────────────┐  queue group  ┌────────────────┐
//! │ CommandClient│──────────▶│     NATS     │──────────────▶│ CommandServer  │
//! │  (callers)   │◀──────────│              │◀──────────────│  + Handler     │
//! └──────────────┘   reply    └──────────────┘    reply      └────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use messaging::{CommandServer, NatsBroker, NatsConfig};
//!
//! let config = NatsConfig::from_env()?;
//! let broker = Arc::new(NatsBroker::connect(&config).await?);
//! let server = CommandServer::new(broker, Arc::new(handler), &config);
//! server.run(shutdown_rx).await?;
//! ```

mod broker;
mod client;
mod config;
mod envelope;
mod error;
#[cfg(feature = "nats")]
mod nats;
mod server;

pub use broker::{MessageBroker, MessageStream, ReceivedMessage};
pub use client::CommandClient;
pub use config::NatsConfig;
pub use envelope::{command_subject, CommandEnvelope, ReplyEnvelope};
pub use error::{MessagingError, RpcError};
#[cfg(feature = "nats")]
pub use nats::NatsBroker;
pub use server::{CommandHandler, CommandServer};
