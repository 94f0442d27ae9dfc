//! Command Intake HTTP service.
//!
//! Accepts order-creation requests, mints the order identity and order
//! number, and publishes a `CreateOrder` command. Nothing is persisted at
//! this tier: a publish failure means the order never entered the pipeline
//! and the client must retry the whole request (a retry mints a NEW
//! identity, so blind retries can create distinct orders).
//!
//! # Routes
//!
//! - `POST /orders` — validate, mint, publish; 201 `{id, numero_orden}`
//! - `GET /health` — liveness

pub mod config;
pub mod routes;
pub mod service;

pub use config::IntakeConfig;
pub use routes::intake_router;
pub use service::{CreateOrderRequest, IntakeError, IntakeService, OrderReceipt};
