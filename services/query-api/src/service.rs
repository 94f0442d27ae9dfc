//! Read-side query service with cache-aside lookups.

use medisupply_cache::{CacheStats, OrderCache};
use medisupply_core::order::{OrderId, OrderProjection, OrderSummary};
use medisupply_postgres::{OrderFilter, ProjectionStore, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Upper bound on page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Errors raised by queries.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No projection exists for the order.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The read-model store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Requested page, before normalization.
#[derive(Clone, Copy, Debug, Default)]
pub struct Page {
    /// 1-based page number.
    pub page: Option<i64>,
    /// Rows per page.
    pub page_size: Option<i64>,
}

impl Page {
    /// Normalize to a valid `(page, page_size)` pair.
    ///
    /// Page defaults to 1 and is floored at 1; page size defaults to 10
    /// and is clamped to 1..=100.
    #[must_use]
    pub fn normalize(self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

/// One page of order summaries, with the pagination envelope clients page
/// through.
#[derive(Clone, Debug, Serialize)]
pub struct OrderListPage {
    /// The rows on this page, newest first.
    pub data: Vec<OrderSummary>,
    /// Total rows matching the filter.
    pub total: i64,
    /// The page served (1-based, after normalization).
    pub page: i64,
    /// The page size served (after normalization).
    pub page_size: i64,
    /// Total pages at this page size.
    pub total_pages: i64,
}

/// Cache connectivity and statistics for the health endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct CacheHealth {
    /// "healthy" when the cache answers a ping, "unhealthy" otherwise.
    pub health: &'static str,
    /// Point-in-time Redis statistics.
    pub stats: CacheStats,
}

/// Query service over the read model and its cache.
#[derive(Clone)]
pub struct OrderQueryService {
    store: ProjectionStore,
    cache: OrderCache,
}

impl OrderQueryService {
    /// Create a query service with its dependencies injected.
    #[must_use]
    pub const fn new(store: ProjectionStore, cache: OrderCache) -> Self {
        Self { store, cache }
    }

    /// Fetch one order, cache-aside.
    ///
    /// A cache hit returns without touching the store. On a miss (or any
    /// cache failure) the store is queried; a found projection is written
    /// back to the cache best-effort before returning.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] if no projection exists for `id`.
    /// - [`QueryError::Store`] if the store fails.
    pub async fn get_order(&self, id: OrderId) -> Result<OrderProjection, QueryError> {
        if let Some(cached) = self.cache.get(id).await {
            return Ok(cached);
        }

        let projection = self
            .store
            .get(id)
            .await?
            .ok_or(QueryError::NotFound(id))?;

        // Cache write failures are logged inside and never fail the read.
        self.cache.set(&projection).await;

        Ok(projection)
    }

    /// List one page of summaries matching the filter, newest first.
    ///
    /// Listings go straight to the store; they are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Store`] if the store fails.
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<OrderListPage, QueryError> {
        let (page, page_size) = page.normalize();
        let offset = (page - 1) * page_size;

        let result = self.store.list(filter, page_size, offset).await?;
        let total_pages = if result.total == 0 {
            0
        } else {
            (result.total + page_size - 1) / page_size
        };

        Ok(OrderListPage {
            data: result.data,
            total: result.total,
            page,
            page_size,
            total_pages,
        })
    }

    /// All projection ids.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Store`] if the store fails.
    pub async fn list_ids(&self) -> Result<Vec<OrderId>, QueryError> {
        Ok(self.store.list_ids().await?)
    }

    /// Cache connectivity and statistics.
    pub async fn cache_health(&self) -> CacheHealth {
        let health = if self.cache.ping().await {
            "healthy"
        } else {
            "unhealthy"
        };
        CacheHealth {
            health,
            stats: self.cache.stats().await,
        }
    }

    /// Direct cache invalidation hook for correction flows.
    ///
    /// Nothing in the pipeline calls this; see the crate docs.
    pub async fn invalidate_cached(&self, id: OrderId) -> bool {
        self.cache.invalidate(id).await
    }

    /// Count rows matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Store`] if the store fails.
    pub async fn count_orders(&self, filter: &OrderFilter) -> Result<i64, QueryError> {
        Ok(self.store.count(filter).await?)
    }
}
