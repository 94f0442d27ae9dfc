//! Mock publisher implementations for testing.
//!
//! Services take a [`MessagePublisher`] at construction, so tests swap the
//! Kafka producer for one of these and assert on what was (or was not)
//! published without a broker.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use medisupply_core::publisher::{MessagePublisher, PublishError, SerializedMessage};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Publisher that captures every message in memory.
///
/// Clones share the same capture buffer, so a test can hand one clone to the
/// service under test and keep another for assertions.
///
/// # Example
///
/// ```
/// use medisupply_core::publisher::{MessagePublisher, SerializedMessage};
/// use medisupply_testing::mocks::InMemoryPublisher;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let publisher = InMemoryPublisher::new();
/// let message = SerializedMessage {
///     message_type: "ordenes.CreateOrder.v1".to_string(),
///     key: None,
///     data: b"{}".to_vec(),
/// };
/// publisher.publish("ordenes.commands", &message).await?;
///
/// assert_eq!(publisher.published().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryPublisher {
    published: Arc<Mutex<Vec<(String, SerializedMessage)>>>,
}

impl InMemoryPublisher {
    /// Create a new publisher with an empty capture buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages as `(topic, message)` pairs, in publish order.
    #[must_use]
    pub fn published(&self) -> Vec<(String, SerializedMessage)> {
        self.published.lock().unwrap().clone()
    }

    /// Captured messages for one topic, in publish order.
    #[must_use]
    pub fn published_to(&self, topic: &str) -> Vec<SerializedMessage> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Drain the capture buffer, returning everything captured so far.
    #[must_use]
    pub fn take(&self) -> Vec<(String, SerializedMessage)> {
        std::mem::take(&mut *self.published.lock().unwrap())
    }

    /// Number of captured messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    /// Whether nothing has been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.published.lock().unwrap().is_empty()
    }

    /// Clear the capture buffer (for test isolation).
    pub fn clear(&self) {
        self.published.lock().unwrap().clear();
    }
}

impl MessagePublisher for InMemoryPublisher {
    fn publish(
        &self,
        topic: &str,
        message: &SerializedMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        let topic = topic.to_string();
        let message = message.clone();
        Box::pin(async move {
            self.published.lock().unwrap().push((topic, message));
            Ok(())
        })
    }
}

/// Publisher that fails every publish.
///
/// Used to test the paths where the broker is down: intake returning 503,
/// the command handler surfacing a publish failure after commit.
#[derive(Clone, Debug, Default)]
pub struct FailingPublisher {
    attempts: Arc<Mutex<usize>>,
}

impl FailingPublisher {
    /// Create a new failing publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of publishes attempted against this publisher.
    #[must_use]
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl MessagePublisher for FailingPublisher {
    fn publish(
        &self,
        topic: &str,
        _message: &SerializedMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        let topic = topic.to_string();
        Box::pin(async move {
            *self.attempts.lock().unwrap() += 1;
            Err(PublishError::PublishFailed {
                topic,
                reason: "broker unavailable (test)".to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(message_type: &str) -> SerializedMessage {
        SerializedMessage {
            message_type: message_type.to_string(),
            key: None,
            data: b"{}".to_vec(),
        }
    }

    #[tokio::test]
    async fn in_memory_publisher_captures_in_order() {
        let publisher = InMemoryPublisher::new();
        publisher
            .publish("commands", &message("a"))
            .await
            .unwrap();
        publisher.publish("events", &message("b")).await.unwrap();

        let all = publisher.published();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0, "commands");
        assert_eq!(all[1].1.message_type, "b");
        assert_eq!(publisher.published_to("events").len(), 1);
    }

    #[tokio::test]
    async fn take_drains_the_buffer() {
        let publisher = InMemoryPublisher::new();
        publisher
            .publish("commands", &message("a"))
            .await
            .unwrap();

        assert_eq!(publisher.take().len(), 1);
        assert!(publisher.is_empty());
    }

    #[tokio::test]
    async fn clones_share_the_buffer() {
        let publisher = InMemoryPublisher::new();
        let clone = publisher.clone();
        clone.publish("commands", &message("a")).await.unwrap();

        assert_eq!(publisher.len(), 1);
    }

    #[tokio::test]
    async fn failing_publisher_fails_and_counts() {
        let publisher = FailingPublisher::new();
        let result = publisher.publish("commands", &message("a")).await;

        assert!(matches!(
            result,
            Err(PublishError::PublishFailed { topic, .. }) if topic == "commands"
        ));
        assert_eq!(publisher.attempts(), 1);
    }
}
