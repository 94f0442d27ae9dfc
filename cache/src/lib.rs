//! Redis cache-aside layer for order reads.
//!
//! Projections are cached under `order:<id>` as JSON with a TTL (300 s by
//! default). The cache is strictly advisory: every failure — connection
//! refused, corrupt payload, serialization error — is logged and degrades
//! to a miss or a no-op. A cache problem never fails a request.
//!
//! Corrupt entries are deleted on read so the next lookup repopulates them
//! from the store.
//!
//! # Example
//!
//! ```no_run
//! use medisupply_cache::OrderCache;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = OrderCache::new("redis://127.0.0.1:6379").await?;
//! # Ok(())
//! # }
//! ```

use medisupply_core::order::{OrderId, OrderProjection};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::Serialize;
use thiserror::Error;

/// Default time-to-live for cached orders, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Error raised while connecting to Redis.
///
/// Only construction can fail; every operation afterwards degrades
/// silently instead of erroring.
#[derive(Error, Debug)]
#[error("cache connection failed: {0}")]
pub struct CacheConnectError(String);

/// Point-in-time cache statistics, taken from Redis `INFO`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CacheStats {
    /// "connected", "disconnected" or "error".
    pub status: String,
    /// Human-readable memory usage.
    pub memory_used: Option<String>,
    /// Currently connected clients.
    pub connected_clients: Option<i64>,
    /// Commands processed since startup.
    pub total_commands_processed: Option<i64>,
    /// Keyspace hits since startup.
    pub keyspace_hits: Option<i64>,
    /// Keyspace misses since startup.
    pub keyspace_misses: Option<i64>,
}

/// Cache-aside store for order projections.
#[derive(Clone)]
pub struct OrderCache {
    /// Connection manager handles pooling and reconnection.
    conn: ConnectionManager,
    /// TTL applied when a set does not specify one.
    default_ttl_secs: u64,
}

impl OrderCache {
    /// Connect to Redis with the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConnectError`] if the client or connection manager
    /// cannot be created.
    pub async fn new(redis_url: &str) -> Result<Self, CacheConnectError> {
        Self::with_ttl(redis_url, DEFAULT_TTL_SECS).await
    }

    /// Connect to Redis with a custom default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConnectError`] if the client or connection manager
    /// cannot be created.
    pub async fn with_ttl(redis_url: &str, default_ttl_secs: u64) -> Result<Self, CacheConnectError> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheConnectError(format!("failed to create client: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheConnectError(format!("failed to create connection manager: {e}")))?;
        Ok(Self {
            conn,
            default_ttl_secs,
        })
    }

    /// The cache key for an order.
    #[must_use]
    pub fn order_key(id: OrderId) -> String {
        format!("order:{id}")
    }

    /// Look up an order in the cache.
    ///
    /// Returns `None` on a miss or on any failure. A corrupt entry is
    /// deleted so the next read repopulates it.
    pub async fn get(&self, id: OrderId) -> Option<OrderProjection> {
        let mut conn = self.conn.clone();
        let key = Self::order_key(id);

        let cached: Option<String> = match conn.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(order_id = %id, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let raw = cached?;
        match serde_json::from_str(&raw) {
            Ok(projection) => {
                tracing::debug!(order_id = %id, "cache hit");
                Some(projection)
            }
            Err(e) => {
                tracing::error!(order_id = %id, error = %e, "corrupt cache entry, deleting");
                self.invalidate(id).await;
                None
            }
        }
    }

    /// Store an order in the cache with the default TTL.
    ///
    /// Returns whether the write succeeded; failures are logged and
    /// swallowed — they must not affect the response being served.
    pub async fn set(&self, projection: &OrderProjection) -> bool {
        self.set_with_ttl(projection, self.default_ttl_secs).await
    }

    /// Store an order in the cache with an explicit TTL.
    pub async fn set_with_ttl(&self, projection: &OrderProjection, ttl_secs: u64) -> bool {
        let mut conn = self.conn.clone();
        let key = Self::order_key(projection.id);

        let serialized = match serde_json::to_string(projection) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::error!(order_id = %projection.id, error = %e, "failed to serialize order for cache");
                return false;
            }
        };

        match conn.set_ex::<_, _, ()>(&key, serialized, ttl_secs).await {
            Ok(()) => {
                tracing::debug!(order_id = %projection.id, ttl_secs = ttl_secs, "order cached");
                true
            }
            Err(e) => {
                tracing::warn!(order_id = %projection.id, error = %e, "cache write failed");
                false
            }
        }
    }

    /// Delete the cache entry for an order.
    ///
    /// No write path in the pipeline calls this — projections are never
    /// mutated in scope — but external correction flows need the hook.
    pub async fn invalidate(&self, id: OrderId) -> bool {
        let mut conn = self.conn.clone();
        let key = Self::order_key(id);
        match conn.del::<_, i64>(&key).await {
            Ok(deleted) => deleted > 0,
            Err(e) => {
                tracing::warn!(order_id = %id, error = %e, "cache delete failed");
                false
            }
        }
    }

    /// Whether the cache answers a `PING`.
    pub async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }

    /// Point-in-time statistics from Redis `INFO`.
    pub async fn stats(&self) -> CacheStats {
        let mut conn = self.conn.clone();
        let info: String = match redis::cmd("INFO").query_async(&mut conn).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch cache stats");
                return CacheStats {
                    status: "error".to_string(),
                    ..CacheStats::default()
                };
            }
        };

        let field = |name: &str| -> Option<String> {
            info.lines()
                .find_map(|line| line.strip_prefix(name).and_then(|rest| rest.strip_prefix(':')))
                .map(|value| value.trim().to_string())
        };

        CacheStats {
            status: "connected".to_string(),
            memory_used: field("used_memory_human"),
            connected_clients: field("connected_clients").and_then(|v| v.parse().ok()),
            total_commands_processed: field("total_commands_processed").and_then(|v| v.parse().ok()),
            keyspace_hits: field("keyspace_hits").and_then(|v| v.parse().ok()),
            keyspace_misses: field("keyspace_misses").and_then(|v| v.parse().ok()),
        }
    }
}
