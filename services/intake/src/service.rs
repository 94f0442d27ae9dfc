//! Order intake: validation, identity minting, command publishing.

use chrono::{DateTime, Utc};
use medisupply_core::codec::MessageError;
use medisupply_core::message::CreateOrderCommand;
use medisupply_core::order::{OrderId, OrderLineInput, OrderNumber};
use medisupply_core::publisher::{MessagePublisher, PublishError, SerializedMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// An order-creation request as submitted by a client.
///
/// The client never supplies an id, an order number, or a total; all three
/// are server-side concerns.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateOrderRequest {
    /// Estimated delivery date.
    pub fecha_entrega_estimada: DateTime<Utc>,
    /// Order-level notes.
    #[serde(default)]
    pub observaciones: Option<String>,
    /// Client reference (opaque).
    pub id_cliente: Uuid,
    /// Seller reference (opaque).
    pub id_vendedor: Uuid,
    /// Origin warehouse reference (opaque).
    pub id_bodega_origen: Uuid,
    /// Creator reference (opaque).
    pub creado_por: Uuid,
    /// Requested line items.
    pub detalles: Vec<OrderLineInput>,
}

/// What the client gets back once the command is on the topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// Minted order identity.
    pub id: OrderId,
    /// Minted order number.
    pub numero_orden: OrderNumber,
}

/// Errors raised while taking in an order.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// The request failed validation.
    #[error("{0}")]
    Validation(String),

    /// The command could not be encoded.
    #[error("failed to encode command: {0}")]
    Encoding(#[from] MessageError),

    /// The command could not be published.
    #[error("failed to publish command: {0}")]
    Publish(#[from] PublishError),
}

/// Command Intake service.
///
/// Holds the publisher injected at construction and the command topic name.
#[derive(Clone)]
pub struct IntakeService {
    publisher: Arc<dyn MessagePublisher>,
    commands_topic: String,
}

impl IntakeService {
    /// Create an intake service publishing to `commands_topic`.
    pub fn new(publisher: Arc<dyn MessagePublisher>, commands_topic: impl Into<String>) -> Self {
        Self {
            publisher,
            commands_topic: commands_topic.into(),
        }
    }

    /// Validate the request, mint identity and order number, publish the
    /// command, and return the receipt.
    ///
    /// The minted `id` is the idempotency key for everything downstream;
    /// `numero_orden` collisions are not checked here — the unique
    /// constraint at persistence time is the final arbiter.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::Validation`] if `detalles` is empty or any line has
    ///   a non-positive `cantidad`.
    /// - [`IntakeError::Publish`] if the broker does not acknowledge the
    ///   command; nothing was persisted, the order never entered the
    ///   pipeline.
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderReceipt, IntakeError> {
        validate(&request)?;

        let command = CreateOrderCommand {
            id: OrderId::generate(),
            numero_orden: OrderNumber::generate(Utc::now()),
            fecha_entrega_estimada: request.fecha_entrega_estimada,
            observaciones: request.observaciones,
            id_cliente: request.id_cliente,
            id_vendedor: request.id_vendedor,
            id_bodega_origen: request.id_bodega_origen,
            creado_por: request.creado_por,
            detalles: request.detalles,
        };

        let serialized = SerializedMessage::from_message(&command)?;
        self.publisher
            .publish(&self.commands_topic, &serialized)
            .await?;

        tracing::info!(
            order_id = %command.id,
            numero_orden = %command.numero_orden,
            lines = command.detalles.len(),
            topic = %self.commands_topic,
            "Create-order command published"
        );

        Ok(OrderReceipt {
            id: command.id,
            numero_orden: command.numero_orden,
        })
    }
}

fn validate(request: &CreateOrderRequest) -> Result<(), IntakeError> {
    if request.detalles.is_empty() {
        return Err(IntakeError::Validation(
            "detalles must contain at least one line item".to_string(),
        ));
    }
    if let Some(line) = request.detalles.iter().find(|l| l.cantidad <= 0) {
        return Err(IntakeError::Validation(format!(
            "cantidad must be positive for producto {}",
            line.id_producto
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medisupply_core::codec;
    use medisupply_core::message::Message;
    use medisupply_testing::mocks::{FailingPublisher, InMemoryPublisher};
    use rust_decimal::Decimal;

    fn request(detalles: Vec<OrderLineInput>) -> CreateOrderRequest {
        CreateOrderRequest {
            fecha_entrega_estimada: Utc::now(),
            observaciones: None,
            id_cliente: Uuid::new_v4(),
            id_vendedor: Uuid::new_v4(),
            id_bodega_origen: Uuid::new_v4(),
            creado_por: Uuid::new_v4(),
            detalles,
        }
    }

    fn line(cantidad: i32) -> OrderLineInput {
        OrderLineInput {
            id_producto: Uuid::new_v4(),
            cantidad,
            precio_unitario: Decimal::new(1000, 2),
            observaciones: None,
        }
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)] // Panics: happy path returns a receipt
    async fn create_order_publishes_command_with_minted_identity() {
        let publisher = InMemoryPublisher::new();
        let service = IntakeService::new(Arc::new(publisher.clone()), "ordenes.commands");

        let receipt = service.create_order(request(vec![line(2)])).await.unwrap();

        let published = publisher.published_to("ordenes.commands");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].message_type, CreateOrderCommand::MESSAGE_TYPE);
        assert_eq!(published[0].key, Some(receipt.id.to_string()));

        let command: CreateOrderCommand = codec::decode(&published[0].data).unwrap();
        assert_eq!(command.id, receipt.id);
        assert_eq!(command.numero_orden, receipt.numero_orden);
    }

    #[tokio::test]
    async fn empty_detalles_is_rejected_before_publishing() {
        let publisher = InMemoryPublisher::new();
        let service = IntakeService::new(Arc::new(publisher.clone()), "ordenes.commands");

        let result = service.create_order(request(vec![])).await;

        assert!(matches!(result, Err(IntakeError::Validation(_))));
        assert!(publisher.is_empty());
    }

    #[tokio::test]
    async fn non_positive_cantidad_is_rejected() {
        let publisher = InMemoryPublisher::new();
        let service = IntakeService::new(Arc::new(publisher.clone()), "ordenes.commands");

        let result = service.create_order(request(vec![line(0)])).await;

        assert!(matches!(result, Err(IntakeError::Validation(_))));
        assert!(publisher.is_empty());
    }

    #[tokio::test]
    async fn publish_failure_surfaces_as_intake_error() {
        let service =
            IntakeService::new(Arc::new(FailingPublisher::new()), "ordenes.commands");

        let result = service.create_order(request(vec![line(1)])).await;

        assert!(matches!(result, Err(IntakeError::Publish(_))));
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)] // Panics: both calls succeed
    async fn each_request_mints_a_fresh_identity() {
        let publisher = InMemoryPublisher::new();
        let service = IntakeService::new(Arc::new(publisher), "ordenes.commands");

        let first = service.create_order(request(vec![line(1)])).await.unwrap();
        let second = service.create_order(request(vec![line(1)])).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.numero_orden, second.numero_orden);
    }
}
