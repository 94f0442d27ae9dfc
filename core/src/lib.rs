//! # MediSupply Core
//!
//! Domain types, message schemas and the pipeline seams for the MediSupply
//! order pipeline.
//!
//! The pipeline is a small CQRS arrangement: a command intake publishes a
//! `CreateOrder` command, an idempotent command handler persists the order
//! and publishes an `OrderCreated` event, a projection handler builds the
//! denormalized read model, and a query API serves reads with a cache-aside
//! layer in front.
//!
//! ```text
//! ┌──────────────┐   CreateOrder.v1    ┌─────────────────┐
//! │Command Intake│────────────────────▶│ Command Handler  │
//! └──────────────┘   [command topic]   └────────┬─────────┘
//!                                               │ write store (ordenes)
//!                                               ▼
//!                                      ┌─────────────────┐
//!                    OrderCreated.v1   │   (committed)    │
//!                   ◀──────────────────┴─────────────────┘
//!                    [event topic]
//!                          │
//!                          ▼
//!                 ┌───────────────────┐        ┌───────────┐
//!                 │Projection Handler │        │ Query API │
//!                 └────────┬──────────┘        └─────┬─────┘
//!                          ▼                         │
//!                  (order_projections) ◀─────────────┘ (+ cache)
//! ```
//!
//! ## Key Principles
//!
//! - **At-least-once delivery**: the transport may redeliver any message;
//!   every consumer is idempotent (pre-check or unique-constraint plus
//!   compensating read).
//! - **Tagged schemas**: every payload carries a versioned `type` field and
//!   consumers decode-or-reject; untyped maps never cross a boundary.
//! - **Explicit dependency injection**: stores and publishers are handed to
//!   handlers at construction, never resolved from ambient state.
//! - **One handler, two transports**: the same [`handler::MessageHandler`]
//!   sits behind an HTTP push endpoint or a pull-based consumer loop.

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

pub mod codec;
pub mod envelope;
pub mod handler;
pub mod message;
pub mod order;
pub mod publisher;

pub use codec::MessageError;
pub use envelope::PushEnvelope;
pub use handler::{FailureKind, HandlerError, MessageHandler};
pub use message::{CreateOrderCommand, Message, OrderCreated};
pub use order::{
    Order, OrderId, OrderLine, OrderLineInput, OrderNumber, OrderProjection, OrderStatus,
    OrderSummary,
};
pub use publisher::{MessagePublisher, PublishError, SerializedMessage};
