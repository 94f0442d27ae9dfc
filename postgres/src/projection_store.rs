//! Read-model store for order projections.
//!
//! The projection handler writes through [`ProjectionStore::apply`], which
//! uses the same idempotent-insert primitive as the write side: attempt the
//! insert, and on a unique violation re-fetch by key and return the existing
//! row. Replays of the same event neither fail nor duplicate.
//!
//! The query API reads through [`ProjectionStore::get`] / [`list`] /
//! [`count`]; lists apply an equality filter on `estado` and range filters
//! on `fecha_creacion`, ordered newest-first with offset/limit pagination.
//!
//! [`list`]: ProjectionStore::list
//! [`count`]: ProjectionStore::count

use crate::{StoreError, is_unique_violation};
use chrono::{DateTime, Utc};
use medisupply_core::order::{
    OrderId, OrderLine, OrderNumber, OrderProjection, OrderStatus, OrderSummary,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Raw `order_projections` row.
#[derive(sqlx::FromRow)]
struct ProjectionRow {
    id: Uuid,
    numero_orden: String,
    fecha_creacion: DateTime<Utc>,
    fecha_actualizacion: DateTime<Utc>,
    fecha_entrega_estimada: DateTime<Utc>,
    estado: String,
    valor_total: Decimal,
    id_cliente: Uuid,
    id_vendedor: Uuid,
    id_bodega_origen: Uuid,
    creado_por: Uuid,
    detalles: String,
    cantidad_items: i32,
    observaciones: Option<String>,
    version: i32,
    processed_at: DateTime<Utc>,
}

impl TryFrom<ProjectionRow> for OrderProjection {
    type Error = StoreError;

    fn try_from(row: ProjectionRow) -> Result<Self, StoreError> {
        let detalles: Vec<OrderLine> = serde_json::from_str(&row.detalles)
            .map_err(|e| StoreError::Serialization(format!("embedded detalles: {e}")))?;
        Ok(Self {
            id: OrderId::from_uuid(row.id),
            numero_orden: OrderNumber::parse(&row.numero_orden)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            fecha_creacion: row.fecha_creacion,
            fecha_actualizacion: row.fecha_actualizacion,
            fecha_entrega_estimada: row.fecha_entrega_estimada,
            estado: row.estado.parse().map_err(StoreError::Serialization)?,
            valor_total: row.valor_total,
            id_cliente: row.id_cliente,
            id_vendedor: row.id_vendedor,
            id_bodega_origen: row.id_bodega_origen,
            creado_por: row.creado_por,
            detalles,
            cantidad_items: row.cantidad_items,
            observaciones: row.observaciones,
            version: row.version,
            processed_at: row.processed_at,
        })
    }
}

/// Raw summary row for list queries.
#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    numero_orden: String,
    fecha_creacion: DateTime<Utc>,
    estado: String,
    valor_total: Decimal,
    id_cliente: Uuid,
    cantidad_items: i32,
    fecha_entrega_estimada: DateTime<Utc>,
}

impl TryFrom<SummaryRow> for OrderSummary {
    type Error = StoreError;

    fn try_from(row: SummaryRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: OrderId::from_uuid(row.id),
            numero_orden: OrderNumber::parse(&row.numero_orden)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            fecha_creacion: row.fecha_creacion,
            estado: row.estado.parse().map_err(StoreError::Serialization)?,
            valor_total: row.valor_total,
            id_cliente: row.id_cliente,
            cantidad_items: row.cantidad_items,
            fecha_entrega_estimada: row.fecha_entrega_estimada,
        })
    }
}

/// Filters applied by list and count queries.
#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    /// Equality filter on lifecycle state.
    pub estado: Option<OrderStatus>,
    /// Inclusive lower bound on `fecha_creacion`.
    pub fecha_creacion_desde: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `fecha_creacion`.
    pub fecha_creacion_hasta: Option<DateTime<Utc>>,
}

/// One page of order summaries.
#[derive(Clone, Debug)]
pub struct OrderPage {
    /// The rows on this page, newest first.
    pub data: Vec<OrderSummary>,
    /// Total rows matching the filter across all pages.
    pub total: i64,
}

const FILTER_CLAUSE: &str = "($1::text IS NULL OR estado = $1) \
     AND ($2::timestamptz IS NULL OR fecha_creacion >= $2) \
     AND ($3::timestamptz IS NULL OR fecha_creacion <= $3)";

/// Read-model store over the `order_projections` table.
#[derive(Clone)]
pub struct ProjectionStore {
    pool: PgPool,
}

impl ProjectionStore {
    /// Create a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotently persist a projection row.
    ///
    /// Returns the stored projection and whether this call inserted it. A
    /// replay of the same event resolves to the existing row via the
    /// unique-violation compensating read — never an error, never a
    /// duplicate.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Constraint`] for a unique violation that does not
    ///   resolve to an existing row.
    /// - [`StoreError::Database`] for other database failures.
    pub async fn apply(
        &self,
        projection: &OrderProjection,
    ) -> Result<(OrderProjection, bool), StoreError> {
        let detalles = serde_json::to_string(&projection.detalles)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let insert = sqlx::query(
            "INSERT INTO order_projections \
             (id, numero_orden, fecha_creacion, fecha_actualizacion, fecha_entrega_estimada, \
              estado, valor_total, id_cliente, id_vendedor, id_bodega_origen, creado_por, \
              detalles, cantidad_items, observaciones, version, processed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(projection.id.as_uuid())
        .bind(projection.numero_orden.as_str())
        .bind(projection.fecha_creacion)
        .bind(projection.fecha_actualizacion)
        .bind(projection.fecha_entrega_estimada)
        .bind(projection.estado.as_str())
        .bind(projection.valor_total)
        .bind(projection.id_cliente)
        .bind(projection.id_vendedor)
        .bind(projection.id_bodega_origen)
        .bind(projection.creado_por)
        .bind(&detalles)
        .bind(projection.cantidad_items)
        .bind(projection.observaciones.as_deref())
        .bind(projection.version)
        .bind(projection.processed_at)
        .execute(&self.pool)
        .await;

        match insert {
            Ok(_) => {
                tracing::info!(
                    order_id = %projection.id,
                    numero_orden = %projection.numero_orden,
                    cantidad_items = projection.cantidad_items,
                    "projection created"
                );
                Ok((projection.clone(), true))
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(
                    order_id = %projection.id,
                    "duplicate event delivery detected by unique constraint"
                );
                if let Some(existing) = self.get(projection.id).await? {
                    return Ok((existing, false));
                }
                if let Some(existing) = self.get_by_numero(&projection.numero_orden).await? {
                    return Ok((existing, false));
                }
                Err(StoreError::Constraint(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the full projection for one order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure or
    /// [`StoreError::Serialization`] if the stored row is corrupt.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderProjection>, StoreError> {
        let row = sqlx::query_as::<_, ProjectionRow>(
            "SELECT * FROM order_projections WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(OrderProjection::try_from).transpose()
    }

    async fn get_by_numero(
        &self,
        numero_orden: &OrderNumber,
    ) -> Result<Option<OrderProjection>, StoreError> {
        let row = sqlx::query_as::<_, ProjectionRow>(
            "SELECT * FROM order_projections WHERE numero_orden = $1",
        )
        .bind(numero_orden.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(OrderProjection::try_from).transpose()
    }

    /// List one page of summaries matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        limit: i64,
        offset: i64,
    ) -> Result<OrderPage, StoreError> {
        let estado = filter.estado.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            "SELECT id, numero_orden, fecha_creacion, estado, valor_total, id_cliente, \
             cantidad_items, fecha_entrega_estimada \
             FROM order_projections WHERE {FILTER_CLAUSE} \
             ORDER BY fecha_creacion DESC LIMIT $4 OFFSET $5"
        ))
        .bind(estado)
        .bind(filter.fecha_creacion_desde)
        .bind(filter.fecha_creacion_hasta)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let data = rows
            .into_iter()
            .map(OrderSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let total = self.count(filter).await?;
        Ok(OrderPage { data, total })
    }

    /// Count rows matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn count(&self, filter: &OrderFilter) -> Result<i64, StoreError> {
        let estado = filter.estado.map(|s| s.as_str());
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM order_projections WHERE {FILTER_CLAUSE}"
        ))
        .bind(estado)
        .bind(filter.fecha_creacion_desde)
        .bind(filter.fecha_creacion_hasta)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// All projection ids, used by the query API's id listing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_ids(&self) -> Result<Vec<OrderId>, StoreError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM order_projections")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| OrderId::from_uuid(id)).collect())
    }
}
