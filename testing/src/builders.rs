//! Fixture builders for commands and push envelopes.

#![allow(clippy::unwrap_used)] // Test fixtures encode cleanly by construction
#![allow(clippy::missing_panics_doc)]

use chrono::{Duration, Utc};
use medisupply_core::codec;
use medisupply_core::envelope::PushEnvelope;
use medisupply_core::message::{CreateOrderCommand, Message};
use medisupply_core::order::{OrderId, OrderLineInput, OrderNumber};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A valid create-order command with two line items.
///
/// Line totals are 2 x 10.00 + 3 x 5.00, so the server-computed order total
/// is 35.00.
#[must_use]
pub fn sample_create_order_command() -> CreateOrderCommand {
    let now = Utc::now();
    CreateOrderCommand {
        id: OrderId::generate(),
        numero_orden: OrderNumber::generate(now),
        fecha_entrega_estimada: now + Duration::days(3),
        observaciones: Some("entrega en porteria".to_string()),
        id_cliente: Uuid::new_v4(),
        id_vendedor: Uuid::new_v4(),
        id_bodega_origen: Uuid::new_v4(),
        creado_por: Uuid::new_v4(),
        detalles: vec![
            OrderLineInput {
                id_producto: Uuid::new_v4(),
                cantidad: 2,
                precio_unitario: Decimal::new(1000, 2),
                observaciones: None,
            },
            OrderLineInput {
                id_producto: Uuid::new_v4(),
                cantidad: 3,
                precio_unitario: Decimal::new(500, 2),
                observaciones: Some("cadena de frio".to_string()),
            },
        ],
    }
}

/// Wrap a message in a push envelope the way a broker push delivery would.
#[must_use]
pub fn push_envelope_for<M: Message>(message: &M) -> PushEnvelope {
    let payload = codec::encode(message).unwrap();
    PushEnvelope::wrap(&payload)
}
