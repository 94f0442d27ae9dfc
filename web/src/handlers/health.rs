//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, Router, http::StatusCode, routing::get};
use serde::Serialize;

/// Liveness response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the process is serving requests.
    pub status: &'static str,
    /// Service name, for fleet-wide health dashboards.
    pub service: &'static str,
}

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, broker, cache).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "service": "query-api"
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check(service: &'static str) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            service,
        }),
    )
}

/// Router exposing `GET /health` for a named service.
///
/// Merge into the service router after its state has been applied.
pub fn health_router(service: &'static str) -> Router {
    Router::new().route("/health", get(move || health_check(service)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, Json(body)) = health_check("intake").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.service, "intake");
    }

    #[tokio::test]
    // Panics: test server setup failures are test environment issues.
    #[allow(clippy::expect_used)]
    async fn test_health_router_serves_get_health() {
        let server = TestServer::new(health_router("query-api")).expect("test server");
        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "query-api");
    }
}
