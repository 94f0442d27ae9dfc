//! Shared Axum plumbing for the MediSupply order services.
//!
//! Every service in the pipeline exposes an HTTP surface — the intake and
//! query APIs for clients, the handlers for broker push delivery — and they
//! all share the same error mapping, health endpoint, middleware stack and
//! startup sequence. This crate holds that shared shell so the services only
//! contain their own routes.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::AppError;
pub use handlers::health::health_router;
pub use server::{init_tracing, serve, with_middleware};
