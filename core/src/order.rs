//! Order domain types shared across the pipeline.
//!
//! The write side owns [`Order`] and [`OrderLine`]; the read side owns
//! [`OrderProjection`] and [`OrderSummary`]. Both sides are keyed by the same
//! [`OrderId`], which is minted exactly once at command intake and carried
//! through both topics — it is the durable idempotency key for everything
//! downstream.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an order.
///
/// Assigned by Command Intake and never regenerated downstream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Mint a fresh order identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Error returned when parsing an [`OrderNumber`] that does not match the
/// `ORD-<YYMMDD>-<8 hex>` format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order number: {0}")]
pub struct InvalidOrderNumber(pub String);

/// Human-readable order code, format `ORD-<YYMMDD>-<8-char-uppercase-hex>`.
///
/// Generated once at intake. Collisions are not checked at generation time —
/// the probability is acceptably low and the unique constraint on the write
/// store is the final arbiter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a new order number for the given date.
    ///
    /// The random suffix is the first eight hex characters of a fresh UUID,
    /// uppercased.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let date_part = now.format("%y%m%d");
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(8)
            .collect::<String>()
            .to_uppercase();
        Self(format!("ORD-{date_part}-{suffix}"))
    }

    /// Validate and wrap an existing order number.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidOrderNumber`] if the value does not match
    /// `ORD-<6 digits>-<8 uppercase hex>`.
    pub fn parse(value: &str) -> Result<Self, InvalidOrderNumber> {
        let mut parts = value.splitn(3, '-');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some("ORD"), Some(date), Some(suffix))
                if date.len() == 6
                    && date.bytes().all(|b| b.is_ascii_digit())
                    && suffix.len() == 8
                    && suffix.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        );
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidOrderNumber(value.to_string()))
        }
    }

    /// The order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an order.
///
/// Only `PENDIENTE` is assigned in this pipeline; no further transitions are
/// defined in scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Freshly created, awaiting downstream processing.
    #[serde(rename = "PENDIENTE")]
    Pendiente,
}

impl OrderStatus {
    /// The status as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "PENDIENTE",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDIENTE" => Ok(Self::Pendiente),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// A requested line item, as supplied by the client at intake.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLineInput {
    /// Referenced product (opaque, never dereferenced in this subsystem).
    pub id_producto: Uuid,
    /// Quantity ordered.
    pub cantidad: i32,
    /// Price per unit.
    pub precio_unitario: Decimal,
    /// Optional free-form notes.
    pub observaciones: Option<String>,
}

impl OrderLineInput {
    /// The line subtotal, `precio_unitario * cantidad`.
    ///
    /// Computed server-side; a client-supplied total is never trusted.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.precio_unitario * Decimal::from(self.cantidad)
    }
}

/// Sum of line subtotals — the order's `valor_total`.
#[must_use]
pub fn total_value(lines: &[OrderLineInput]) -> Decimal {
    lines.iter().map(OrderLineInput::subtotal).sum()
}

/// A persisted order line (write model row).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Row identity.
    pub id: Uuid,
    /// Owning order.
    pub id_orden: Uuid,
    /// Referenced product.
    pub id_producto: Uuid,
    /// Quantity ordered.
    pub cantidad: i32,
    /// Price per unit.
    pub precio_unitario: Decimal,
    /// `precio_unitario * cantidad`, computed at persistence time.
    pub subtotal: Decimal,
    /// Optional free-form notes.
    pub observaciones: Option<String>,
    /// Row creation timestamp.
    pub fecha_creacion: DateTime<Utc>,
    /// Row update timestamp.
    pub fecha_actualizacion: DateTime<Utc>,
}

/// A persisted order with its line items (write model).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identity, supplied by Command Intake.
    pub id: OrderId,
    /// Human-readable order code, unique.
    pub numero_orden: OrderNumber,
    /// Lifecycle state, `PENDIENTE` at creation.
    pub estado: OrderStatus,
    /// Sum of line subtotals, computed server-side.
    pub valor_total: Decimal,
    /// Client reference (opaque).
    pub id_cliente: Uuid,
    /// Seller reference (opaque).
    pub id_vendedor: Uuid,
    /// Origin warehouse reference (opaque).
    pub id_bodega_origen: Uuid,
    /// Creator reference (opaque).
    pub creado_por: Uuid,
    /// Estimated delivery date.
    pub fecha_entrega_estimada: DateTime<Utc>,
    /// Order-level notes.
    pub observaciones: Option<String>,
    /// Row creation timestamp.
    pub fecha_creacion: DateTime<Utc>,
    /// Row update timestamp.
    pub fecha_actualizacion: DateTime<Utc>,
    /// Line items.
    pub detalles: Vec<OrderLine>,
}

/// Denormalized read-model row built by the projection handler.
///
/// Keyed by the same `id` as the write-side order; created exactly once per
/// order identity and never updated in scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderProjection {
    /// Same identity as the write-side order (copied from the event).
    pub id: OrderId,
    /// Unique order code.
    pub numero_orden: OrderNumber,
    /// Order creation timestamp from the write side.
    pub fecha_creacion: DateTime<Utc>,
    /// Order update timestamp from the write side.
    pub fecha_actualizacion: DateTime<Utc>,
    /// Estimated delivery date.
    pub fecha_entrega_estimada: DateTime<Utc>,
    /// Lifecycle state.
    pub estado: OrderStatus,
    /// Order total.
    pub valor_total: Decimal,
    /// Client reference.
    pub id_cliente: Uuid,
    /// Seller reference.
    pub id_vendedor: Uuid,
    /// Origin warehouse reference.
    pub id_bodega_origen: Uuid,
    /// Creator reference.
    pub creado_por: Uuid,
    /// Flattened line items, embedded as serialized JSON in storage.
    pub detalles: Vec<OrderLine>,
    /// Sum of per-line quantities.
    pub cantidad_items: i32,
    /// Order-level notes.
    pub observaciones: Option<String>,
    /// Projection schema version.
    pub version: i32,
    /// When the projection handler processed the event.
    pub processed_at: DateTime<Utc>,
}

impl OrderProjection {
    /// Build a projection row from an order-created event.
    ///
    /// Copies header fields, keeps the persisted line items, and computes
    /// `cantidad_items` as the sum of per-line quantities.
    #[must_use]
    pub fn from_order(order: &Order, processed_at: DateTime<Utc>) -> Self {
        let cantidad_items = order.detalles.iter().map(|d| d.cantidad).sum();
        Self {
            id: order.id,
            numero_orden: order.numero_orden.clone(),
            fecha_creacion: order.fecha_creacion,
            fecha_actualizacion: order.fecha_actualizacion,
            fecha_entrega_estimada: order.fecha_entrega_estimada,
            estado: order.estado,
            valor_total: order.valor_total,
            id_cliente: order.id_cliente,
            id_vendedor: order.id_vendedor,
            id_bodega_origen: order.id_bodega_origen,
            creado_por: order.creado_por,
            detalles: order.detalles.clone(),
            cantidad_items,
            observaciones: order.observaciones.clone(),
            version: 1,
            processed_at,
        }
    }

    /// The summary view of this projection, used by list endpoints.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            numero_orden: self.numero_orden.clone(),
            fecha_creacion: self.fecha_creacion,
            estado: self.estado,
            valor_total: self.valor_total,
            id_cliente: self.id_cliente,
            cantidad_items: self.cantidad_items,
            fecha_entrega_estimada: self.fecha_entrega_estimada,
        }
    }
}

/// Compact order view returned by list queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Order identity.
    pub id: OrderId,
    /// Unique order code.
    pub numero_orden: OrderNumber,
    /// Order creation timestamp.
    pub fecha_creacion: DateTime<Utc>,
    /// Lifecycle state.
    pub estado: OrderStatus,
    /// Order total.
    pub valor_total: Decimal,
    /// Client reference.
    pub id_cliente: Uuid,
    /// Sum of per-line quantities.
    pub cantidad_items: i32,
    /// Estimated delivery date.
    pub fecha_entrega_estimada: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    #[allow(clippy::unwrap_used)] // Panics: test literal is a valid decimal
    fn line(cantidad: i32, precio: &str) -> OrderLineInput {
        OrderLineInput {
            id_producto: Uuid::new_v4(),
            cantidad,
            precio_unitario: Decimal::from_str_exact(precio).unwrap(),
            observaciones: None,
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Panics: fixed date is valid
    fn order_number_matches_expected_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let number = OrderNumber::generate(now);
        let value = number.as_str();

        assert!(value.starts_with("ORD-250309-"), "got {value}");
        assert_eq!(value.len(), "ORD-".len() + 6 + 1 + 8);
        assert!(OrderNumber::parse(value).is_ok());
    }

    #[test]
    fn order_number_parse_rejects_bad_formats() {
        assert!(OrderNumber::parse("ORD-250309-abcdef12").is_err()); // lowercase
        assert!(OrderNumber::parse("ORD-25030-ABCDEF12").is_err()); // short date
        assert!(OrderNumber::parse("ORD-250309-ABCDEF1").is_err()); // short suffix
        assert!(OrderNumber::parse("XYZ-250309-ABCDEF12").is_err()); // wrong prefix
        assert!(OrderNumber::parse("ORD-250309-ABCDEFGH").is_err()); // non-hex
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Panics: test literal is a valid decimal
    fn total_value_sums_line_subtotals() {
        let lines = vec![line(2, "10.00"), line(3, "5.00")];
        assert_eq!(total_value(&lines), Decimal::from_str_exact("35.00").unwrap());
    }

    #[test]
    fn subtotal_multiplies_price_by_quantity() {
        let l = line(4, "2.50");
        assert_eq!(l.subtotal(), Decimal::from(10));
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Panics: "PENDIENTE" is a known status
    fn status_round_trips_through_text() {
        let status: OrderStatus = "PENDIENTE".parse().unwrap();
        assert_eq!(status, OrderStatus::Pendiente);
        assert_eq!(status.to_string(), "PENDIENTE");
        assert!("ENVIADA".parse::<OrderStatus>().is_err());
    }

    proptest! {
        #[test]
        fn total_equals_sum_of_products(
            quantities in proptest::collection::vec(1i32..1000, 1..10),
            prices in proptest::collection::vec(0i64..100_000, 10),
        ) {
            let lines: Vec<OrderLineInput> = quantities
                .iter()
                .zip(prices.iter())
                .map(|(q, p)| OrderLineInput {
                    id_producto: Uuid::new_v4(),
                    cantidad: *q,
                    // prices in cents, two decimal places
                    precio_unitario: Decimal::new(*p, 2),
                    observaciones: None,
                })
                .collect();

            let expected: Decimal = lines
                .iter()
                .map(|l| Decimal::from(l.cantidad) * l.precio_unitario)
                .sum();

            prop_assert_eq!(total_value(&lines), expected);
        }
    }
}
