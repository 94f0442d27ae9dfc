//! The idempotent projection builder.

use chrono::Utc;
use medisupply_core::handler::{FailureKind, HandlerError, MessageHandler};
use medisupply_core::message::OrderCreated;
use medisupply_core::order::OrderProjection;
use medisupply_postgres::{ProjectionStore, StoreError};
use thiserror::Error;

/// Errors raised while building a projection.
#[derive(Error, Debug)]
pub enum ProjectionHandlerError {
    /// The read-model store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HandlerError for ProjectionHandlerError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Store(StoreError::Database(_)) => FailureKind::Transient,
            Self::Store(_) => FailureKind::Unprocessable,
        }
    }
}

/// Handles `OrderCreated` events: one read-model row per order.
pub struct OrderProjectionHandler {
    store: ProjectionStore,
}

impl OrderProjectionHandler {
    /// Create a handler over the read-model store.
    #[must_use]
    pub const fn new(store: ProjectionStore) -> Self {
        Self { store }
    }
}

impl MessageHandler for OrderProjectionHandler {
    type Message = OrderCreated;
    type Outcome = OrderProjection;
    type Error = ProjectionHandlerError;

    async fn handle(&self, event: OrderCreated) -> Result<OrderProjection, ProjectionHandlerError> {
        let projection = OrderProjection::from_order(&event.order, Utc::now());
        let (stored, created) = self.store.apply(&projection).await?;

        if created {
            tracing::info!(
                order_id = %stored.id,
                numero_orden = %stored.numero_orden,
                cantidad_items = stored.cantidad_items,
                "Projection created"
            );
        } else {
            tracing::info!(
                order_id = %stored.id,
                "Duplicate event delivery resolved to existing projection"
            );
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_are_transient() {
        let err = ProjectionHandlerError::Store(StoreError::Database(sqlx::Error::PoolClosed));
        assert_eq!(err.failure_kind(), FailureKind::Transient);
    }

    #[test]
    fn serialization_errors_are_unprocessable() {
        let err =
            ProjectionHandlerError::Store(StoreError::Serialization("bad detalles".to_string()));
        assert_eq!(err.failure_kind(), FailureKind::Unprocessable);
    }
}
