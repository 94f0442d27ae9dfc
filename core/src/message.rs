//! Message schemas carried over the command and event topics.
//!
//! Every message is a versioned, tagged schema: the wire form is a JSON
//! object with a `"type"` field holding the identifier returned by
//! [`Message::MESSAGE_TYPE`]. Consumers decode-or-reject via
//! [`crate::codec`]; an unexpected or missing tag is an error, never a
//! silently-accepted dictionary.

use crate::order::{Order, OrderId, OrderLineInput, OrderNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// A payload that can travel over a topic.
///
/// # Naming Convention
///
/// The identifier includes the owning context and a schema version, e.g.
/// `"ordenes.CreateOrder.v1"`. Bump the version on any incompatible change.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable, versioned type identifier for this schema.
    const MESSAGE_TYPE: &'static str;

    /// Partitioning key for this message, if any.
    ///
    /// Messages sharing a key are delivered in order relative to each other.
    /// The order pipeline keys everything by order id so a command and its
    /// event land on the same partition.
    fn key(&self) -> Option<String> {
        None
    }
}

/// Command requesting the creation of an order.
///
/// Published by Command Intake with the identity and order number already
/// assigned; the handler must not regenerate either.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderCommand {
    /// Order identity minted at intake — the idempotency key downstream.
    pub id: OrderId,
    /// Order number minted at intake, unique at persistence time.
    pub numero_orden: OrderNumber,
    /// Estimated delivery date.
    pub fecha_entrega_estimada: DateTime<Utc>,
    /// Order-level notes.
    pub observaciones: Option<String>,
    /// Client reference (opaque).
    pub id_cliente: Uuid,
    /// Seller reference (opaque).
    pub id_vendedor: Uuid,
    /// Origin warehouse reference (opaque).
    pub id_bodega_origen: Uuid,
    /// Creator reference (opaque).
    pub creado_por: Uuid,
    /// Requested line items; non-empty by intake validation.
    pub detalles: Vec<OrderLineInput>,
}

impl Message for CreateOrderCommand {
    const MESSAGE_TYPE: &'static str = "ordenes.CreateOrder.v1";

    fn key(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}

/// Event published after an order has been durably created.
///
/// Carries the full persisted order (header plus line items) so the
/// projection handler needs no further lookups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderCreated {
    /// The persisted order, flattened into the payload.
    #[serde(flatten)]
    pub order: Order,
}

impl OrderCreated {
    /// Wrap a persisted order.
    #[must_use]
    pub const fn new(order: Order) -> Self {
        Self { order }
    }
}

impl Message for OrderCreated {
    const MESSAGE_TYPE: &'static str = "ordenes.OrderCreated.v1";

    fn key(&self) -> Option<String> {
        Some(self.order.id.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::order::{OrderLine, OrderStatus};
    use rust_decimal::Decimal;

    pub(crate) fn sample_command() -> CreateOrderCommand {
        CreateOrderCommand {
            id: OrderId::generate(),
            numero_orden: OrderNumber::generate(Utc::now()),
            fecha_entrega_estimada: Utc::now(),
            observaciones: Some("entrega en porteria".to_string()),
            id_cliente: Uuid::new_v4(),
            id_vendedor: Uuid::new_v4(),
            id_bodega_origen: Uuid::new_v4(),
            creado_por: Uuid::new_v4(),
            detalles: vec![OrderLineInput {
                id_producto: Uuid::new_v4(),
                cantidad: 2,
                precio_unitario: Decimal::new(1000, 2),
                observaciones: None,
            }],
        }
    }

    #[test]
    fn command_is_keyed_by_order_id() {
        let cmd = sample_command();
        assert_eq!(cmd.key(), Some(cmd.id.to_string()));
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Panics: test fixture serializes cleanly
    fn event_flattens_order_fields() {
        let now = Utc::now();
        let id = OrderId::generate();
        let order = Order {
            id,
            numero_orden: OrderNumber::generate(now),
            estado: OrderStatus::Pendiente,
            valor_total: Decimal::new(3500, 2),
            id_cliente: Uuid::new_v4(),
            id_vendedor: Uuid::new_v4(),
            id_bodega_origen: Uuid::new_v4(),
            creado_por: Uuid::new_v4(),
            fecha_entrega_estimada: now,
            observaciones: None,
            fecha_creacion: now,
            fecha_actualizacion: now,
            detalles: vec![OrderLine {
                id: Uuid::new_v4(),
                id_orden: id.as_uuid(),
                id_producto: Uuid::new_v4(),
                cantidad: 2,
                precio_unitario: Decimal::new(1000, 2),
                subtotal: Decimal::new(2000, 2),
                observaciones: None,
                fecha_creacion: now,
                fecha_actualizacion: now,
            }],
        };

        let value = serde_json::to_value(OrderCreated::new(order)).unwrap();
        // Header fields sit at the top level, not nested under "order".
        assert!(value.get("numero_orden").is_some());
        assert!(value.get("detalles").is_some());
        assert!(value.get("order").is_none());
        // Decimals travel as plain JSON numbers.
        assert!(value.get("valor_total").is_some_and(serde_json::Value::is_number));
    }
}
