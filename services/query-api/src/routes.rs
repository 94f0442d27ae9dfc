//! HTTP surface for the Query API.

use crate::service::{CacheHealth, OrderListPage, OrderQueryService, Page, QueryError};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use medisupply_core::order::{OrderId, OrderProjection, OrderStatus};
use medisupply_postgres::OrderFilter;
use medisupply_web::AppError;
use serde::Deserialize;
use uuid::Uuid;

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(id) => Self::not_found("Order", id),
            QueryError::Store(_) => {
                Self::internal("Failed to query orders").with_source(err.into())
            }
        }
    }
}

/// Query-string parameters accepted by the listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Equality filter on lifecycle state.
    pub estado: Option<OrderStatus>,
    /// Inclusive lower bound on `fecha_creacion`.
    pub fecha_creacion_desde: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `fecha_creacion`.
    pub fecha_creacion_hasta: Option<DateTime<Utc>>,
    /// 1-based page number.
    pub page: Option<i64>,
    /// Rows per page (1–100).
    pub page_size: Option<i64>,
}

/// `GET /orders/{id}` — full projection, cache-aside.
async fn get_order(
    State(service): State<OrderQueryService>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderProjection>, AppError> {
    let projection = service.get_order(OrderId::from_uuid(id)).await?;
    Ok(Json(projection))
}

/// `GET /orders/` — filtered, paginated summaries.
async fn list_orders(
    State(service): State<OrderQueryService>,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderListPage>, AppError> {
    let filter = OrderFilter {
        estado: params.estado,
        fecha_creacion_desde: params.fecha_creacion_desde,
        fecha_creacion_hasta: params.fecha_creacion_hasta,
    };
    let page = Page {
        page: params.page,
        page_size: params.page_size,
    };
    let listing = service.list_orders(&filter, page).await?;
    Ok(Json(listing))
}

/// `GET /orders/ids` — every projection id.
async fn list_ids(
    State(service): State<OrderQueryService>,
) -> Result<Json<Vec<OrderId>>, AppError> {
    Ok(Json(service.list_ids().await?))
}

/// `GET /orders/health/cache` — cache connectivity + stats.
async fn cache_health(State(service): State<OrderQueryService>) -> Json<CacheHealth> {
    Json(service.cache_health().await)
}

/// Router for the query API.
pub fn query_router(service: OrderQueryService) -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/", get(list_orders))
        .route("/orders/ids", get(list_ids))
        .route("/orders/health/cache", get(cache_health))
        .route("/orders/:id", get(get_order))
        .with_state(service)
}
