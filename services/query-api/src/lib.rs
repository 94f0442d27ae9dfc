//! Query API service.
//!
//! Serves the read side of the pipeline: single-order lookups through a
//! cache-aside Redis layer, filtered and paginated listings straight from
//! the read model, and a cache-health endpoint. Nothing here writes to the
//! read model; staleness cannot arise from in-scope writes because nothing
//! mutates a projection after creation.
//!
//! # Routes
//!
//! - `GET /orders/{id}` — full projection (cache-aside), 404 when absent
//! - `GET /orders/` — filtered, paginated, newest-first summaries
//! - `GET /orders/ids` — all projection ids
//! - `GET /orders/health/cache` — cache connectivity + stats
//! - `GET /health` — liveness

pub mod config;
pub mod routes;
pub mod service;

pub use config::QueryApiConfig;
pub use routes::query_router;
pub use service::{OrderListPage, OrderQueryService, Page, QueryError};
