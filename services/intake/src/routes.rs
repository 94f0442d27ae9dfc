//! HTTP surface for Command Intake.

use crate::service::{CreateOrderRequest, IntakeError, IntakeService, OrderReceipt};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use medisupply_web::AppError;

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Validation(message) => Self::validation(message),
            IntakeError::Encoding(_) => {
                Self::internal("Failed to encode command").with_source(err.into())
            }
            IntakeError::Publish(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to publish order command".to_string(),
                "PUBLISH_FAILED".to_string(),
            )
            .with_source(err.into()),
        }
    }
}

/// `POST /orders` — accept an order-creation request.
async fn create_order(
    State(service): State<IntakeService>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderReceipt>), AppError> {
    let receipt = service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Router for the intake service.
pub fn intake_router(service: IntakeService) -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)] // Test code uses expect for clear failure messages

    use super::*;
    use axum_test::TestServer;
    use medisupply_testing::mocks::{FailingPublisher, InMemoryPublisher};
    use serde_json::json;
    use std::sync::Arc;

    fn server(service: IntakeService) -> TestServer {
        TestServer::new(intake_router(service)).expect("test server")
    }

    fn valid_body() -> serde_json::Value {
        json!({
            "fecha_entrega_estimada": "2026-09-02T12:00:00Z",
            "id_cliente": uuid::Uuid::new_v4(),
            "id_vendedor": uuid::Uuid::new_v4(),
            "id_bodega_origen": uuid::Uuid::new_v4(),
            "creado_por": uuid::Uuid::new_v4(),
            "detalles": [
                {"id_producto": uuid::Uuid::new_v4(), "cantidad": 2, "precio_unitario": 10.0},
                {"id_producto": uuid::Uuid::new_v4(), "cantidad": 3, "precio_unitario": 5.0}
            ]
        })
    }

    #[tokio::test]
    async fn post_orders_returns_201_with_receipt() {
        let publisher = InMemoryPublisher::new();
        let server = server(IntakeService::new(
            Arc::new(publisher.clone()),
            "ordenes.commands",
        ));

        let response = server.post("/orders").json(&valid_body()).await;

        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert!(body["id"].is_string());
        let numero = body["numero_orden"].as_str().expect("numero_orden");
        assert!(numero.starts_with("ORD-"));
        assert_eq!(publisher.len(), 1);
    }

    #[tokio::test]
    async fn post_orders_with_empty_detalles_returns_422() {
        let server = server(IntakeService::new(
            Arc::new(InMemoryPublisher::new()),
            "ordenes.commands",
        ));

        let mut body = valid_body();
        body["detalles"] = json!([]);
        let response = server.post("/orders").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn post_orders_with_zero_cantidad_returns_422() {
        let server = server(IntakeService::new(
            Arc::new(InMemoryPublisher::new()),
            "ordenes.commands",
        ));

        let mut body = valid_body();
        body["detalles"][0]["cantidad"] = json!(0);
        let response = server.post("/orders").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn post_orders_when_broker_is_down_returns_publish_failed() {
        let server = server(IntakeService::new(
            Arc::new(FailingPublisher::new()),
            "ordenes.commands",
        ));

        let response = server.post("/orders").json(&valid_body()).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "PUBLISH_FAILED");
    }
}
