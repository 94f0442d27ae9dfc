//! Outbound publishing seam.
//!
//! Producers hold a [`MessagePublisher`] handle injected at construction —
//! never resolved from ambient state — and hand it [`SerializedMessage`]s.
//! Implementations live elsewhere: a Kafka-compatible producer in
//! `medisupply-pubsub` and an in-memory capture in `medisupply-testing`.
//!
//! # Delivery Semantics
//!
//! Publishing is at-least-once: a successful return means the broker
//! acknowledged the message, but consumers must still tolerate duplicates.
//! No distributed transaction spans a store write and a publish; the write
//! commits first and the publish follows.

use crate::codec::{self, MessageError};
use crate::message::Message;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors raised while publishing a message.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// Could not reach or configure the broker.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The broker rejected or timed out the publish.
    #[error("publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// The message could not be encoded.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),
}

/// A message encoded into its wire form, ready for a topic.
#[derive(Clone, Debug)]
pub struct SerializedMessage {
    /// Versioned schema identifier (e.g. `"ordenes.CreateOrder.v1"`).
    pub message_type: String,
    /// Partitioning key; deliveries sharing a key stay ordered.
    pub key: Option<String>,
    /// Tagged JSON payload.
    pub data: Vec<u8>,
}

impl SerializedMessage {
    /// Encode a message into its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Serialization`] if encoding fails.
    pub fn from_message<M: Message>(message: &M) -> Result<Self, MessageError> {
        Ok(Self {
            message_type: M::MESSAGE_TYPE.to_string(),
            key: message.key(),
            data: codec::encode(message)?,
        })
    }
}

impl fmt::Display for SerializedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedMessage {{ type: {}, size: {} bytes }}",
            self.message_type,
            self.data.len()
        )
    }
}

/// Publisher handle for one or more topics.
///
/// Dyn-compatible so services can hold `Arc<dyn MessagePublisher>` when they
/// do not want to be generic over the transport.
pub trait MessagePublisher: Send + Sync {
    /// Publish a message to a topic.
    ///
    /// Resolves once the transport has acknowledged the message; an error
    /// means the message may or may not have been delivered and the caller
    /// decides whether the operation as a whole fails.
    fn publish(
        &self,
        topic: &str,
        message: &SerializedMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CreateOrderCommand;

    #[test]
    #[allow(clippy::unwrap_used)] // Panics: fixture encodes cleanly
    fn serialized_message_carries_type_and_key() {
        let cmd = crate::message::tests::sample_command();
        let serialized = SerializedMessage::from_message(&cmd).unwrap();
        assert_eq!(serialized.message_type, CreateOrderCommand::MESSAGE_TYPE);
        assert_eq!(serialized.key, Some(cmd.id.to_string()));
        assert!(!serialized.data.is_empty());
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Panics: fixture encodes cleanly
    fn serialized_message_display_shows_type_and_size() {
        let cmd = crate::message::tests::sample_command();
        let serialized = SerializedMessage::from_message(&cmd).unwrap();
        let display = format!("{serialized}");
        assert!(display.contains("ordenes.CreateOrder.v1"));
        assert!(display.contains("bytes"));
    }
}
