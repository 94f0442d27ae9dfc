//! Integration tests for `OrderCache` using testcontainers.
//!
//! These tests use a real Redis instance to validate cache-aside behavior.
//!
//! # Requirements
//!
//! Docker must be running to execute these tests. The tests will
//! automatically start a Redis 7 container using testcontainers.

#![allow(clippy::expect_used)] // Test code uses expect for clear failure messages

use chrono::Utc;
use medisupply_cache::OrderCache;
use medisupply_core::order::{Order, OrderId, OrderLine, OrderNumber, OrderProjection, OrderStatus};
use rust_decimal::Decimal;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::{REDIS_PORT, Redis};
use uuid::Uuid;

/// Helper to start a Redis container and return a connected cache.
///
/// Returns both the container (to keep it alive) and the cache.
///
/// # Panics
/// Panics if container setup fails (test environment issue).
async fn setup_cache() -> (ContainerAsync<Redis>, OrderCache, String) {
    let container = Redis::default()
        .start()
        .await
        .expect("Failed to start redis container");

    let port = container
        .get_host_port_ipv4(REDIS_PORT)
        .await
        .expect("Failed to get redis port");

    let redis_url = format!("redis://127.0.0.1:{port}");
    let cache = OrderCache::new(&redis_url)
        .await
        .expect("Failed to connect to redis");

    (container, cache, redis_url)
}

fn sample_projection() -> OrderProjection {
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
        fecha_entrega_estimada: now + chrono::Duration::days(3),
        observaciones: None,
        fecha_creacion: now,
        fecha_actualizacion: now,
        detalles: vec![OrderLine {
            id: Uuid::new_v4(),
            id_orden: id.as_uuid(),
            id_producto: Uuid::new_v4(),
            cantidad: 2,
            precio_unitario: Decimal::new(1750, 2),
            subtotal: Decimal::new(3500, 2),
            observaciones: None,
            fecha_creacion: now,
            fecha_actualizacion: now,
        }],
    };
    OrderProjection::from_order(&order, now)
}

#[tokio::test]
async fn set_then_get_returns_projection() {
    let (_container, cache, _) = setup_cache().await;
    let projection = sample_projection();

    assert!(cache.set(&projection).await);

    let cached = cache.get(projection.id).await;
    assert_eq!(cached, Some(projection));
}

#[tokio::test]
async fn get_missing_order_is_a_miss() {
    let (_container, cache, _) = setup_cache().await;

    assert_eq!(cache.get(OrderId::generate()).await, None);
}

#[tokio::test]
async fn invalidate_removes_entry() {
    let (_container, cache, _) = setup_cache().await;
    let projection = sample_projection();

    assert!(cache.set(&projection).await);
    assert!(cache.invalidate(projection.id).await);
    assert_eq!(cache.get(projection.id).await, None);

    // Second delete reports nothing removed.
    assert!(!cache.invalidate(projection.id).await);
}

#[tokio::test]
async fn corrupt_entry_is_deleted_on_read() {
    let (_container, cache, redis_url) = setup_cache().await;
    let id = OrderId::generate();
    let key = OrderCache::order_key(id);

    // Plant an entry that is not a valid projection.
    let client = redis::Client::open(redis_url.as_str()).expect("Failed to create client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect");
    let () = redis::AsyncCommands::set(&mut conn, &key, "not json")
        .await
        .expect("Failed to plant corrupt entry");

    assert_eq!(cache.get(id).await, None);

    // The corrupt value must be gone.
    let remaining: Option<String> = redis::AsyncCommands::get(&mut conn, &key)
        .await
        .expect("Failed to read key");
    assert_eq!(remaining, None);
}

#[tokio::test]
async fn set_applies_a_ttl() {
    let (_container, cache, redis_url) = setup_cache().await;
    let projection = sample_projection();

    assert!(cache.set(&projection).await);

    let client = redis::Client::open(redis_url.as_str()).expect("Failed to create client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect");
    let ttl: i64 = redis::cmd("TTL")
        .arg(OrderCache::order_key(projection.id))
        .query_async(&mut conn)
        .await
        .expect("Failed to read TTL");

    assert!(ttl > 0 && ttl <= 300, "expected a bounded TTL, got {ttl}");
}

#[tokio::test]
async fn set_with_ttl_overrides_default() {
    let (_container, cache, redis_url) = setup_cache().await;
    let projection = sample_projection();

    assert!(cache.set_with_ttl(&projection, 30).await);

    let client = redis::Client::open(redis_url.as_str()).expect("Failed to create client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect");
    let ttl: i64 = redis::cmd("TTL")
        .arg(OrderCache::order_key(projection.id))
        .query_async(&mut conn)
        .await
        .expect("Failed to read TTL");

    assert!(ttl > 0 && ttl <= 30, "expected overridden TTL, got {ttl}");
}

#[tokio::test]
async fn ping_and_stats_report_a_healthy_cache() {
    let (_container, cache, _) = setup_cache().await;

    assert!(cache.ping().await);

    let stats = cache.stats().await;
    assert_eq!(stats.status, "connected");
    assert!(stats.memory_used.is_some());
    assert!(stats.connected_clients.is_some());
}
