//! HTTP push endpoint for the projection handler.

use crate::handler::OrderProjectionHandler;
use axum::{Json, Router, extract::State, routing::post};
use medisupply_core::envelope::PushEnvelope;
use medisupply_core::handler::{FailureKind, HandlerError};
use medisupply_core::order::OrderProjection;
use medisupply_pubsub::push::{PushError, handle_push};
use medisupply_web::AppError;
use serde::Serialize;
use std::sync::Arc;

/// Acknowledgement body for a handled push delivery.
#[derive(Debug, Serialize)]
pub struct PushResponse {
    /// The stored projection.
    pub data: OrderProjection,
    /// Human-readable outcome.
    pub message: &'static str,
}

async fn handle_event(
    State(handler): State<Arc<OrderProjectionHandler>>,
    Json(envelope): Json<PushEnvelope>,
) -> Result<Json<PushResponse>, AppError> {
    match handle_push(handler.as_ref(), envelope).await {
        Ok(projection) => Ok(Json(PushResponse {
            data: projection,
            message: "Projection processed",
        })),
        Err(PushError::Envelope(e)) => {
            Err(AppError::bad_request(format!("invalid delivery: {e}")))
        }
        Err(PushError::Handler(e)) => Err(match e.failure_kind() {
            FailureKind::Unprocessable => {
                AppError::bad_request("Event cannot be processed").with_source(e.into())
            }
            FailureKind::Transient => {
                AppError::internal("Projection processing failed").with_source(e.into())
            }
        }),
    }
}

/// Router for the projection handler's push surface.
pub fn projection_handler_router(handler: Arc<OrderProjectionHandler>) -> Router {
    Router::new().route("/", post(handle_event)).with_state(handler)
}
