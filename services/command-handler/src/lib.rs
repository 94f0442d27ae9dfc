//! Command Handler service.
//!
//! Consumes `CreateOrder` commands and durably creates each order exactly
//! once: an existence pre-check absorbs ordinary redeliveries, and the
//! unique-constraint compensating read absorbs the concurrent-delivery
//! race. On first creation the handler publishes an `OrderCreated` event
//! carrying the full persisted order.
//!
//! The same [`OrderCommandHandler`] sits behind two transports: an HTTP
//! push endpoint (`POST /`) and an optional Kafka pull loop, selected by
//! `DELIVERY_MODE`.

pub mod config;
pub mod handler;
pub mod routes;

pub use config::CommandHandlerConfig;
pub use handler::{CommandHandlerError, OrderCommandHandler};
pub use routes::command_handler_router;
