//! Projection Handler service.
//!
//! Consumes `OrderCreated` events and builds exactly one denormalized
//! read-model row per order. Idempotency uses the same insert-then-resolve
//! primitive as the write side: a replayed event lands on the unique
//! constraint and resolves to the existing row instead of erroring.
//!
//! The same [`OrderProjectionHandler`] sits behind an HTTP push endpoint
//! (`POST /`) and an optional Kafka pull loop, selected by `DELIVERY_MODE`.

pub mod config;
pub mod handler;
pub mod routes;

pub use config::ProjectionHandlerConfig;
pub use handler::{OrderProjectionHandler, ProjectionHandlerError};
pub use routes::projection_handler_router;
