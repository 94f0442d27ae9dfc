//! Kafka-compatible transport adapters for the MediSupply order pipeline.
//!
//! This crate owns both faces of the pipeline's message transport:
//!
//! - [`KafkaPublisher`] implements the
//!   [`MessagePublisher`](medisupply_core::publisher::MessagePublisher) seam
//!   over rdkafka, so command intake and the command handler publish to
//!   real topics.
//! - [`consumer::KafkaConsumer`] and [`push::handle_push`] drive the same
//!   [`MessageHandler`](medisupply_core::handler::MessageHandler) from a
//!   pull-based consumer loop or an HTTP push delivery, respectively. The
//!   idempotent-handler logic never changes between the two.
//!
//! # Delivery Semantics
//!
//! At-least-once, end to end:
//! - The producer waits for broker acknowledgement before resolving.
//! - The pull consumer commits offsets manually, only after the handler
//!   returns; a crash before commit means redelivery.
//! - The push adapter returns an error status for transient failures so
//!   the transport redelivers.
//!
//! Handlers MUST be idempotent. Messages are keyed by order id, so every
//! delivery for one order stays on one partition and remains ordered.

pub mod consumer;
pub mod push;

pub use consumer::{ConsumerError, KafkaConsumer};
pub use push::handle_push;

/// How deliveries reach a handler service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// HTTP push endpoint (`POST /`).
    Push,
    /// Long-lived Kafka pull loop.
    Pull,
}

impl DeliveryMode {
    /// Parse a mode string; anything other than `"pull"` is push.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("pull") => Self::Pull,
            _ => Self::Push,
        }
    }
}

use medisupply_core::publisher::{MessagePublisher, PublishError, SerializedMessage};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Kafka-compatible publisher.
///
/// Works against Kafka, Redpanda, or any broker speaking the Kafka
/// protocol. Messages are sent with the payload's partitioning key (the
/// order id) so deliveries for one order maintain order.
pub struct KafkaPublisher {
    /// Producer handle, internally pooled and thread-safe.
    producer: FutureProducer,
    /// Producer send timeout.
    timeout: Duration,
}

impl KafkaPublisher {
    /// Create a publisher with default configuration.
    ///
    /// # Parameters
    ///
    /// - `brokers`: comma-separated broker addresses (e.g. "localhost:9092")
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ConnectionFailed`] if the producer cannot be
    /// created.
    pub fn new(brokers: &str) -> Result<Self, PublishError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> KafkaPublisherBuilder {
        KafkaPublisherBuilder::default()
    }
}

/// Builder for a [`KafkaPublisher`].
#[derive(Default)]
pub struct KafkaPublisherBuilder {
    brokers: Option<String>,
    acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
}

impl KafkaPublisherBuilder {
    /// Set the broker addresses (comma-separated).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the acknowledgment mode: "0", "1" or "all". Default: "1".
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Set the compression codec. Default: "none".
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Set the producer send timeout. Default: 5 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the publisher.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::ConnectionFailed`] if brokers are not set or
    /// the producer cannot be created.
    pub fn build(self) -> Result<KafkaPublisher, PublishError> {
        let brokers = self
            .brokers
            .ok_or_else(|| PublishError::ConnectionFailed("brokers not configured".to_string()))?;

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", self.acks.as_deref().unwrap_or("1"))
            .set("compression.type", self.compression.as_deref().unwrap_or("none"));

        let producer: FutureProducer = config.create().map_err(|e| {
            PublishError::ConnectionFailed(format!("failed to create producer: {e}"))
        })?;

        tracing::info!(
            brokers = %brokers,
            acks = self.acks.as_deref().unwrap_or("1"),
            compression = self.compression.as_deref().unwrap_or("none"),
            "KafkaPublisher created"
        );

        Ok(KafkaPublisher {
            producer,
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
        })
    }
}

impl MessagePublisher for KafkaPublisher {
    fn publish(
        &self,
        topic: &str,
        message: &SerializedMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        let topic = topic.to_string();
        let message = message.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            // Messages without an explicit key partition by schema, like
            // the rest of the topic's traffic.
            let key = message
                .key
                .clone()
                .unwrap_or_else(|| message.message_type.clone());
            let record = FutureRecord::to(&topic).payload(&message.data).key(&key);

            match self.producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        partition = partition,
                        offset = offset,
                        message_type = %message.message_type,
                        "message published"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    tracing::error!(
                        topic = %topic,
                        message_type = %message.message_type,
                        error = %kafka_error,
                        "failed to publish message"
                    );
                    Err(PublishError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kafka_publisher_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<KafkaPublisher>();
        assert_sync::<KafkaPublisher>();
    }

    #[test]
    fn delivery_mode_parses_pull_and_defaults_to_push() {
        assert_eq!(DeliveryMode::parse(Some("pull")), DeliveryMode::Pull);
        assert_eq!(DeliveryMode::parse(Some("http")), DeliveryMode::Push);
        assert_eq!(DeliveryMode::parse(None), DeliveryMode::Push);
    }

    #[test]
    fn builder_requires_brokers() {
        assert!(matches!(
            KafkaPublisher::builder().build(),
            Err(PublishError::ConnectionFailed(_))
        ));
    }
}
