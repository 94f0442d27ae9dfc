//! The idempotent create-order handler.

use medisupply_core::codec::MessageError;
use medisupply_core::handler::{FailureKind, HandlerError, MessageHandler};
use medisupply_core::message::{CreateOrderCommand, OrderCreated};
use medisupply_core::order::Order;
use medisupply_core::publisher::{MessagePublisher, PublishError, SerializedMessage};
use medisupply_postgres::{OrderStore, StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while handling a create-order command.
#[derive(Error, Debug)]
pub enum CommandHandlerError {
    /// The write store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The event could not be encoded.
    #[error("failed to encode event: {0}")]
    Encoding(#[from] MessageError),

    /// The event could not be published after the order committed.
    ///
    /// The order exists; surfacing this makes the transport redeliver the
    /// command, and the redelivery's duplicate path returns the existing
    /// order. The redelivery does NOT republish the event, so the
    /// projection for this order may never be built — there is no outbox.
    #[error("order committed but event publish failed: {0}")]
    EventPublish(#[from] PublishError),
}

impl HandlerError for CommandHandlerError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Store(StoreError::Database(_)) | Self::EventPublish(_) => FailureKind::Transient,
            Self::Store(_) | Self::Encoding(_) => FailureKind::Unprocessable,
        }
    }
}

/// Handles `CreateOrder` commands: idempotent persist, then publish.
pub struct OrderCommandHandler {
    store: OrderStore,
    publisher: Arc<dyn MessagePublisher>,
    events_topic: String,
}

impl OrderCommandHandler {
    /// Create a handler with its dependencies injected.
    pub fn new(
        store: OrderStore,
        publisher: Arc<dyn MessagePublisher>,
        events_topic: impl Into<String>,
    ) -> Self {
        Self {
            store,
            publisher,
            events_topic: events_topic.into(),
        }
    }
}

impl MessageHandler for OrderCommandHandler {
    type Message = CreateOrderCommand;
    type Outcome = Order;
    type Error = CommandHandlerError;

    async fn handle(&self, command: CreateOrderCommand) -> Result<Order, CommandHandlerError> {
        let order_id = command.id;
        let (order, created) = self.store.create(&command).await?;

        if created {
            let event = OrderCreated::new(order.clone());
            let serialized = SerializedMessage::from_message(&event)?;
            if let Err(e) = self
                .publisher
                .publish(&self.events_topic, &serialized)
                .await
            {
                // Partial-failure window: the order is committed but its
                // event is lost unless this delivery is retried.
                tracing::error!(
                    order_id = %order_id,
                    numero_orden = %order.numero_orden,
                    topic = %self.events_topic,
                    error = %e,
                    "Order committed but OrderCreated publish failed"
                );
                return Err(e.into());
            }
            tracing::info!(
                order_id = %order_id,
                numero_orden = %order.numero_orden,
                valor_total = %order.valor_total,
                "Order created and event published"
            );
        } else {
            tracing::info!(
                order_id = %order_id,
                numero_orden = %order.numero_orden,
                "Duplicate command delivery resolved to existing order"
            );
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_database_errors_are_transient() {
        let err = CommandHandlerError::Store(StoreError::Database(sqlx::Error::PoolClosed));
        assert_eq!(err.failure_kind(), FailureKind::Transient);
    }

    #[test]
    fn unresolved_constraint_errors_are_unprocessable() {
        let err = CommandHandlerError::Store(StoreError::Constraint("fk violation".to_string()));
        assert_eq!(err.failure_kind(), FailureKind::Unprocessable);
    }

    #[test]
    fn publish_failures_are_transient() {
        let err = CommandHandlerError::EventPublish(PublishError::PublishFailed {
            topic: "ordenes.events".to_string(),
            reason: "broker down".to_string(),
        });
        assert_eq!(err.failure_kind(), FailureKind::Transient);
    }
}
