//! Write-model store for orders.
//!
//! The command handler's persistence path. Creation is idempotent under
//! at-least-once delivery:
//!
//! 1. pre-check by `id` and return the existing order unchanged;
//! 2. otherwise insert header + line items in one transaction, computing
//!    `subtotal` per line and `valor_total` server-side;
//! 3. if a concurrent duplicate slipped past the pre-check, the insert hits
//!    the unique constraint — roll back and resolve with a compensating
//!    read by `id`, then by `numero_orden`.

use crate::{StoreError, is_unique_violation};
use chrono::{DateTime, Utc};
use medisupply_core::message::CreateOrderCommand;
use medisupply_core::order::{
    Order, OrderId, OrderLine, OrderNumber, OrderStatus, total_value,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Raw `ordenes` row.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    numero_orden: String,
    estado: String,
    valor_total: Decimal,
    id_cliente: Uuid,
    id_vendedor: Uuid,
    id_bodega_origen: Uuid,
    creado_por: Uuid,
    fecha_entrega_estimada: DateTime<Utc>,
    observaciones: Option<String>,
    fecha_creacion: DateTime<Utc>,
    fecha_actualizacion: DateTime<Utc>,
}

/// Raw `detalles_ordenes` row.
#[derive(sqlx::FromRow)]
struct LineRow {
    id: Uuid,
    id_orden: Uuid,
    id_producto: Uuid,
    cantidad: i32,
    precio_unitario: Decimal,
    subtotal: Decimal,
    observaciones: Option<String>,
    fecha_creacion: DateTime<Utc>,
    fecha_actualizacion: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, detalles: Vec<OrderLine>) -> Result<Order, StoreError> {
        Ok(Order {
            id: OrderId::from_uuid(self.id),
            numero_orden: OrderNumber::parse(&self.numero_orden)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            estado: self
                .estado
                .parse::<OrderStatus>()
                .map_err(StoreError::Serialization)?,
            valor_total: self.valor_total,
            id_cliente: self.id_cliente,
            id_vendedor: self.id_vendedor,
            id_bodega_origen: self.id_bodega_origen,
            creado_por: self.creado_por,
            fecha_entrega_estimada: self.fecha_entrega_estimada,
            observaciones: self.observaciones,
            fecha_creacion: self.fecha_creacion,
            fecha_actualizacion: self.fecha_actualizacion,
            detalles,
        })
    }
}

impl From<LineRow> for OrderLine {
    fn from(row: LineRow) -> Self {
        Self {
            id: row.id,
            id_orden: row.id_orden,
            id_producto: row.id_producto,
            cantidad: row.cantidad,
            precio_unitario: row.precio_unitario,
            subtotal: row.subtotal,
            observaciones: row.observaciones,
            fecha_creacion: row.fecha_creacion,
            fecha_actualizacion: row.fecha_actualizacion,
        }
    }
}

const SELECT_ORDER: &str = "SELECT id, numero_orden, estado, valor_total, id_cliente, \
     id_vendedor, id_bodega_origen, creado_por, fecha_entrega_estimada, observaciones, \
     fecha_creacion, fecha_actualizacion FROM ordenes";

/// Write-model store over the `ordenes` and `detalles_ordenes` tables.
#[derive(Clone)]
pub struct OrderStore {
    pool: PgPool,
}

impl OrderStore {
    /// Create a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotently create an order from a command.
    ///
    /// Returns the persisted order and whether this call created it. A
    /// duplicate delivery returns the existing row with `created = false`;
    /// it is never surfaced as an error.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Constraint`] for a unique violation that does not
    ///   resolve to an existing order (not the duplicate-delivery pattern).
    /// - [`StoreError::Database`] for any other database failure; an open
    ///   transaction is rolled back.
    pub async fn create(&self, command: &CreateOrderCommand) -> Result<(Order, bool), StoreError> {
        // Primary defense against at-least-once delivery.
        if let Some(existing) = self.find_by_id(command.id).await? {
            tracing::info!(
                order_id = %command.id,
                numero_orden = %existing.numero_orden,
                "order already exists, skipping duplicate delivery"
            );
            return Ok((existing, false));
        }

        let order = Self::build_order(command, Utc::now());

        let mut tx = self.pool.begin().await?;
        match Self::insert_order(&mut tx, &order).await {
            Ok(()) => {
                tx.commit().await?;
                tracing::info!(
                    order_id = %order.id,
                    numero_orden = %order.numero_orden,
                    valor_total = %order.valor_total,
                    lines = order.detalles.len(),
                    "order created"
                );
                Ok((order, true))
            }
            Err(e) if is_unique_violation(&e) => {
                // Race: a concurrent delivery of the same command committed
                // between our pre-check and insert. Compensating read, not a
                // second write.
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback after unique violation failed");
                }
                tracing::warn!(
                    order_id = %command.id,
                    numero_orden = %command.numero_orden,
                    "duplicate delivery detected by unique constraint"
                );
                self.resolve_duplicate(command, &e).await.map(|o| (o, false))
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }

    /// Fetch an order with its line items.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let lines = self.load_lines(id.as_uuid()).await?;
                Ok(Some(row.into_order(lines)?))
            }
            None => Ok(None),
        }
    }

    /// Fetch an order by its human-readable order number.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn find_by_numero(
        &self,
        numero_orden: &OrderNumber,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE numero_orden = $1"))
            .bind(numero_orden.as_str())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let lines = self.load_lines(row.id).await?;
                Ok(Some(row.into_order(lines)?))
            }
            None => Ok(None),
        }
    }

    fn build_order(command: &CreateOrderCommand, now: DateTime<Utc>) -> Order {
        let detalles: Vec<OrderLine> = command
            .detalles
            .iter()
            .map(|line| OrderLine {
                id: Uuid::new_v4(),
                id_orden: command.id.as_uuid(),
                id_producto: line.id_producto,
                cantidad: line.cantidad,
                precio_unitario: line.precio_unitario,
                subtotal: line.subtotal(),
                observaciones: line.observaciones.clone(),
                fecha_creacion: now,
                fecha_actualizacion: now,
            })
            .collect();

        Order {
            id: command.id,
            numero_orden: command.numero_orden.clone(),
            estado: OrderStatus::Pendiente,
            valor_total: total_value(&command.detalles),
            id_cliente: command.id_cliente,
            id_vendedor: command.id_vendedor,
            id_bodega_origen: command.id_bodega_origen,
            creado_por: command.creado_por,
            fecha_entrega_estimada: command.fecha_entrega_estimada,
            observaciones: command.observaciones.clone(),
            fecha_creacion: now,
            fecha_actualizacion: now,
            detalles,
        }
    }

    async fn insert_order(
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO ordenes \
             (id, numero_orden, estado, valor_total, id_cliente, id_vendedor, \
              id_bodega_origen, creado_por, fecha_entrega_estimada, observaciones, \
              fecha_creacion, fecha_actualizacion) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(order.id.as_uuid())
        .bind(order.numero_orden.as_str())
        .bind(order.estado.as_str())
        .bind(order.valor_total)
        .bind(order.id_cliente)
        .bind(order.id_vendedor)
        .bind(order.id_bodega_origen)
        .bind(order.creado_por)
        .bind(order.fecha_entrega_estimada)
        .bind(order.observaciones.as_deref())
        .bind(order.fecha_creacion)
        .bind(order.fecha_actualizacion)
        .execute(&mut **tx)
        .await?;

        for line in &order.detalles {
            sqlx::query(
                "INSERT INTO detalles_ordenes \
                 (id, id_orden, id_producto, cantidad, precio_unitario, subtotal, \
                  observaciones, fecha_creacion, fecha_actualizacion) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(line.id)
            .bind(line.id_orden)
            .bind(line.id_producto)
            .bind(line.cantidad)
            .bind(line.precio_unitario)
            .bind(line.subtotal)
            .bind(line.observaciones.as_deref())
            .bind(line.fecha_creacion)
            .bind(line.fecha_actualizacion)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn resolve_duplicate(
        &self,
        command: &CreateOrderCommand,
        cause: &sqlx::Error,
    ) -> Result<Order, StoreError> {
        if let Some(existing) = self.find_by_id(command.id).await? {
            return Ok(existing);
        }
        if let Some(existing) = self.find_by_numero(&command.numero_orden).await? {
            return Ok(existing);
        }
        // A unique violation with no matching row is not the duplicate
        // pattern; surface it.
        tracing::error!(
            order_id = %command.id,
            numero_orden = %command.numero_orden,
            "unique violation without an existing order"
        );
        Err(StoreError::Constraint(cause.to_string()))
    }

    async fn load_lines(&self, id_orden: Uuid) -> Result<Vec<OrderLine>, StoreError> {
        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT id, id_orden, id_producto, cantidad, precio_unitario, subtotal, \
             observaciones, fecha_creacion, fecha_actualizacion \
             FROM detalles_ordenes WHERE id_orden = $1 ORDER BY fecha_creacion",
        )
        .bind(id_orden)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(OrderLine::from).collect())
    }
}
