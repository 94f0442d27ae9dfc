//! HTTP push delivery adapter.
//!
//! Push-style transports deliver each message as an HTTP POST carrying a
//! [`PushEnvelope`]. This adapter unwraps the envelope, decodes the tagged
//! payload, and drives the same
//! [`MessageHandler`](medisupply_core::handler::MessageHandler) the pull
//! loop uses. The HTTP service owning the route maps [`PushError`] onto a
//! status code: envelope/decoding failures are client errors (the transport
//! should not redeliver garbage), transient handler failures are server
//! errors (the transport redelivers, and the idempotent handler absorbs
//! the duplicate).

use medisupply_core::codec::{self, MessageError};
use medisupply_core::envelope::PushEnvelope;
use medisupply_core::handler::MessageHandler;
use thiserror::Error;

/// Failure of one push delivery.
#[derive(Error, Debug)]
pub enum PushError<E: std::error::Error> {
    /// The envelope or its payload could not be decoded.
    #[error(transparent)]
    Envelope(#[from] MessageError),

    /// The handler failed.
    #[error(transparent)]
    Handler(E),
}

/// Handle one push delivery: unwrap, decode-or-reject, then handle.
///
/// # Errors
///
/// - [`PushError::Envelope`] for malformed envelopes, bad base64, or
///   payloads that fail the tagged-schema decode.
/// - [`PushError::Handler`] when the handler itself fails; inspect
///   [`failure_kind`](medisupply_core::handler::HandlerError::failure_kind)
///   to pick a response status.
pub async fn handle_push<H: MessageHandler>(
    handler: &H,
    envelope: PushEnvelope,
) -> Result<H::Outcome, PushError<H::Error>> {
    let payload = envelope.payload()?;
    let message = codec::decode::<H::Message>(&payload)?;

    if let Some(message_id) = envelope.message.message_id.as_deref() {
        tracing::debug!(message_id = %message_id, "handling push delivery");
    }

    handler.handle(message).await.map_err(PushError::Handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medisupply_core::handler::{FailureKind, HandlerError};
    use medisupply_core::message::{CreateOrderCommand, Message};
    use serde::Serialize;
    use std::sync::Mutex;

    #[derive(Error, Debug)]
    #[error("boom")]
    struct TestError;

    impl HandlerError for TestError {
        fn failure_kind(&self) -> FailureKind {
            FailureKind::Transient
        }
    }

    #[derive(Serialize)]
    struct Receipt {
        id: String,
    }

    /// Records every command it sees.
    struct RecordingHandler {
        seen: Mutex<Vec<CreateOrderCommand>>,
        fail: bool,
    }

    impl MessageHandler for RecordingHandler {
        type Message = CreateOrderCommand;
        type Outcome = Receipt;
        type Error = TestError;

        async fn handle(&self, message: Self::Message) -> Result<Self::Outcome, Self::Error> {
            if self.fail {
                return Err(TestError);
            }
            let id = message.id.to_string();
            #[allow(clippy::unwrap_used)] // Panics: mutex is never poisoned in tests
            self.seen.lock().unwrap().push(message);
            Ok(Receipt { id })
        }
    }

    fn sample_command() -> CreateOrderCommand {
        use medisupply_core::order::{OrderId, OrderLineInput, OrderNumber};
        CreateOrderCommand {
            id: OrderId::generate(),
            numero_orden: OrderNumber::generate(chrono::Utc::now()),
            fecha_entrega_estimada: chrono::Utc::now(),
            observaciones: None,
            id_cliente: uuid::Uuid::new_v4(),
            id_vendedor: uuid::Uuid::new_v4(),
            id_bodega_origen: uuid::Uuid::new_v4(),
            creado_por: uuid::Uuid::new_v4(),
            detalles: vec![OrderLineInput {
                id_producto: uuid::Uuid::new_v4(),
                cantidad: 1,
                precio_unitario: rust_decimal::Decimal::ONE,
                observaciones: None,
            }],
        }
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)] // Panics: fixtures encode cleanly
    async fn push_delivery_reaches_the_handler() {
        let handler = RecordingHandler {
            seen: Mutex::new(Vec::new()),
            fail: false,
        };
        let cmd = sample_command();
        let envelope = PushEnvelope::wrap(&codec::encode(&cmd).unwrap());

        let receipt = handle_push(&handler, envelope).await.unwrap();
        assert_eq!(receipt.id, cmd.id.to_string());
        let seen = handler.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], cmd);
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)] // Panics: fixtures encode cleanly
    async fn mismatched_schema_is_rejected_before_the_handler() {
        let handler = RecordingHandler {
            seen: Mutex::new(Vec::new()),
            fail: false,
        };
        // An event payload pushed at a command consumer must be rejected.
        let payload = format!(
            "{{\"{}\":\"not.the.right.Schema.v1\"}}",
            codec::TYPE_FIELD
        );
        let envelope = PushEnvelope::wrap(payload.as_bytes());

        let result = handle_push(&handler, envelope).await;
        assert!(matches!(
            result,
            Err(PushError::Envelope(MessageError::UnexpectedType { expected, .. }))
                if expected == CreateOrderCommand::MESSAGE_TYPE
        ));
        assert!(handler.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)] // Panics: fixtures encode cleanly
    async fn handler_failure_is_surfaced() {
        let handler = RecordingHandler {
            seen: Mutex::new(Vec::new()),
            fail: true,
        };
        let envelope = PushEnvelope::wrap(&codec::encode(&sample_command()).unwrap());
        assert!(matches!(
            handle_push(&handler, envelope).await,
            Err(PushError::Handler(TestError))
        ));
    }
}
