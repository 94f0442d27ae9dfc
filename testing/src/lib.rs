//! # MediSupply Testing
//!
//! Testing utilities and helpers for the order pipeline.
//!
//! This crate provides:
//! - Mock publishers that capture or fail deliveries
//! - Fixture builders for commands and push envelopes
//!
//! ## Example
//!
//! ```ignore
//! use medisupply_testing::mocks::InMemoryPublisher;
//! use medisupply_testing::builders::sample_create_order_command;
//!
//! #[tokio::test]
//! async fn test_intake_publishes_command() {
//!     let publisher = InMemoryPublisher::new();
//!     let intake = IntakeService::new(publisher.clone(), "ordenes.commands");
//!
//!     intake.create_order(request).await?;
//!
//!     let published = publisher.published();
//!     assert_eq!(published.len(), 1);
//! }
//! ```

pub mod builders;
pub mod mocks;

pub use builders::{push_envelope_for, sample_create_order_command};
pub use mocks::{FailingPublisher, InMemoryPublisher};
