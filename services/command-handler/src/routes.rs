//! HTTP push endpoint for the command handler.
//!
//! Push-style transports deliver each command as `POST /` with the
//! envelope as the body. The response status tells the transport whether
//! to redeliver: 2xx acknowledges, 4xx drops (unprocessable), 5xx retries.

use crate::handler::OrderCommandHandler;
use axum::{Json, Router, extract::State, routing::post};
use medisupply_core::envelope::PushEnvelope;
use medisupply_core::handler::{FailureKind, HandlerError};
use medisupply_core::order::Order;
use medisupply_pubsub::push::{PushError, handle_push};
use medisupply_web::AppError;
use serde::Serialize;
use std::sync::Arc;

/// Acknowledgement body for a handled push delivery.
#[derive(Debug, Serialize)]
pub struct PushResponse {
    /// The persisted order.
    pub data: Order,
    /// Human-readable outcome.
    pub message: &'static str,
}

async fn handle_command(
    State(handler): State<Arc<OrderCommandHandler>>,
    Json(envelope): Json<PushEnvelope>,
) -> Result<Json<PushResponse>, AppError> {
    match handle_push(handler.as_ref(), envelope).await {
        Ok(order) => Ok(Json(PushResponse {
            data: order,
            message: "Order processed",
        })),
        Err(PushError::Envelope(e)) => {
            Err(AppError::bad_request(format!("invalid delivery: {e}")))
        }
        Err(PushError::Handler(e)) => Err(match e.failure_kind() {
            FailureKind::Unprocessable => {
                AppError::bad_request("Command cannot be processed").with_source(e.into())
            }
            FailureKind::Transient => {
                AppError::internal("Order processing failed").with_source(e.into())
            }
        }),
    }
}

/// Router for the command handler's push surface.
pub fn command_handler_router(handler: Arc<OrderCommandHandler>) -> Router {
    Router::new().route("/", post(handle_command)).with_state(handler)
}
