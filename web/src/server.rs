//! Service startup: tracing initialization and HTTP serving.
//!
//! Every service binary follows the same sequence — install the tracing
//! subscriber, build its router, bind a listener and serve with the shared
//! middleware stack. These helpers keep the binaries down to wiring.

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter` when set. Calling this twice is a
/// programming error and will panic, so do it once at the top of `main`.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
#[allow(clippy::expect_used)] // Subscriber setup failure is unrecoverable at startup.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .expect("tracing subscriber already installed");
}

/// Apply the shared middleware stack to a router.
///
/// Requests get an `x-request-id` (generated when absent, propagated to the
/// response), HTTP spans via `TraceLayer`, and permissive CORS — the APIs
/// are fronted by an ingress that enforces origin policy.
#[must_use]
pub fn with_middleware(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CorsLayer::permissive()),
    )
}

/// Bind `host:port` and serve the router until the process is stopped.
///
/// The shared middleware stack is applied before serving.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(router: Router, host: &str, port: u16) -> std::io::Result<()> {
    let app = with_middleware(router);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await
}
