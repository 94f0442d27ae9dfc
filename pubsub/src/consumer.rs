//! Pull-based consumer loop.
//!
//! Wraps an rdkafka `StreamConsumer` and drives a
//! [`MessageHandler`](medisupply_core::handler::MessageHandler) with each
//! delivery. Offsets are committed manually for at-least-once semantics.
//!
//! # Failure Policy
//!
//! - **Undecodable payloads** (bad tag, schema mismatch, garbage bytes) are
//!   logged, committed, and skipped — redelivering a poison message forever
//!   helps nobody.
//! - **Unprocessable handler failures** are treated the same way.
//! - **Transient handler failures** (store unavailable) stop the loop
//!   without committing, so a restart resumes from the last committed
//!   offset and the message is redelivered.

use medisupply_core::codec;
use medisupply_core::handler::{FailureKind, HandlerError, MessageHandler};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message as _;
use thiserror::Error;

/// Errors raised by the consumer loop.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// Could not create or subscribe the underlying consumer.
    #[error("subscription failed for topic '{topic}': {reason}")]
    SubscriptionFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// The broker connection failed mid-stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// The handler reported a transient failure; the loop stopped without
    /// committing so the message will be redelivered.
    #[error("handler failed: {0}")]
    Handler(String),
}

/// Pull-based consumer bound to one topic and consumer group.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    /// Create a consumer and subscribe it to a topic.
    ///
    /// Manual commits are enabled for at-least-once delivery; new consumer
    /// groups start from the earliest offset so a fresh deployment drains
    /// the backlog.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::SubscriptionFailed`] if the consumer cannot
    /// be created or subscribed.
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self, ConsumerError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| ConsumerError::SubscriptionFailed {
                topic: topic.to_string(),
                reason: format!("failed to create consumer: {e}"),
            })?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| ConsumerError::SubscriptionFailed {
                topic: topic.to_string(),
                reason: format!("failed to subscribe: {e}"),
            })?;

        tracing::info!(
            topic = %topic,
            consumer_group = %group_id,
            manual_commit = true,
            "subscribed to topic"
        );

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }

    /// Consume deliveries forever, driving the handler with each message.
    ///
    /// Returns only on a transport error or a transient handler failure;
    /// the supervisor is expected to restart the process, resuming from the
    /// last committed offset.
    ///
    /// # Errors
    ///
    /// See [`ConsumerError`].
    pub async fn run<H: MessageHandler>(self, handler: &H) -> Result<(), ConsumerError> {
        use futures::StreamExt;

        let mut stream = self.consumer.stream();

        while let Some(delivery) = stream.next().await {
            let message = delivery.map_err(|e| ConsumerError::Transport(e.to_string()))?;

            let Some(payload) = message.payload() else {
                tracing::warn!(topic = %self.topic, offset = message.offset(), "empty delivery, skipping");
                self.commit(&message);
                continue;
            };

            match codec::decode::<H::Message>(payload) {
                Ok(decoded) => match handler.handle(decoded).await {
                    Ok(_) => {
                        tracing::debug!(
                            topic = %self.topic,
                            partition = message.partition(),
                            offset = message.offset(),
                            "message handled"
                        );
                        self.commit(&message);
                    }
                    Err(e) if e.failure_kind() == FailureKind::Unprocessable => {
                        tracing::error!(
                            topic = %self.topic,
                            offset = message.offset(),
                            error = %e,
                            "unprocessable message, skipping"
                        );
                        self.commit(&message);
                    }
                    Err(e) => {
                        tracing::error!(
                            topic = %self.topic,
                            offset = message.offset(),
                            error = %e,
                            "transient handler failure, stopping without commit"
                        );
                        return Err(ConsumerError::Handler(e.to_string()));
                    }
                },
                Err(e) => {
                    // Poison message: commit so it is not replayed forever.
                    tracing::error!(
                        topic = %self.topic,
                        offset = message.offset(),
                        error = %e,
                        "undecodable payload, skipping"
                    );
                    self.commit(&message);
                }
            }
        }

        tracing::debug!(topic = %self.topic, "consumer stream ended");
        Ok(())
    }

    fn commit(&self, message: &rdkafka::message::BorrowedMessage<'_>) {
        if let Err(e) = self.consumer.commit_message(message, CommitMode::Async) {
            // Not fatal: the worst case is a redelivery, which handlers
            // absorb idempotently.
            tracing::warn!(
                topic = %self.topic,
                partition = message.partition(),
                offset = message.offset(),
                error = %e,
                "failed to commit offset (message may be redelivered)"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kafka_consumer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<KafkaConsumer>();
    }
}
