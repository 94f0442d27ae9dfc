//! PostgreSQL storage for the MediSupply order pipeline.
//!
//! Two stores, one per side of the CQRS split:
//!
//! - [`OrderStore`] — the write-optimized relational model (`ordenes` +
//!   `detalles_ordenes`), with the idempotent "read-if-exists, else insert"
//!   creation path the command handler relies on.
//! - [`ProjectionStore`] — the denormalized read model
//!   (`order_projections`), built idempotently from order-created events
//!   and queried by the query API.
//!
//! Both stores resolve duplicate deliveries the same way: attempt the
//! insert, and on a unique violation re-fetch by key and return the
//! existing row. Write and read models may live on separate databases;
//! each service runs [`run_migrations`] against its own pool.

pub mod order_store;
pub mod projection_store;

pub use order_store::OrderStore;
pub use projection_store::{OrderFilter, OrderPage, ProjectionStore};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors raised by the stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A constraint violation that did not resolve to an existing row.
    ///
    /// Surfaced as a client error by the consuming handler; an ordinary
    /// duplicate delivery never produces this.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Row contents could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// SQLSTATE class for unique-constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Whether an sqlx error is a unique-constraint violation.
///
/// The duplicate-delivery compensating read in both stores keys off this:
/// two concurrent deliveries of the same message may both pass the
/// existence pre-check, and the loser of the insert race lands here.
#[must_use]
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

/// Open a connection pool with sane defaults for a single service.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the pool cannot connect.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the embedded migrations against a pool.
///
/// Covers both the write and read model; applying the full set to either
/// database is harmless and keeps single-database deployments simple.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))?;
    Ok(())
}
