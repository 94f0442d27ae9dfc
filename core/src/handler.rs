//! Inbound message handling seam.
//!
//! A [`MessageHandler`] owns the business logic for one message schema and
//! nothing about how it was delivered. The adapters in `medisupply-pubsub`
//! drive the same handler from an HTTP push endpoint or a pull-based
//! consumer loop, so the idempotent-handler logic is written once.
//!
//! Handlers MUST be idempotent: the transport delivers at-least-once, and
//! concurrent deliveries of the same message are possible.

use crate::message::Message;
use serde::Serialize;
use std::future::Future;

/// Classifies a handler failure for the delivering transport.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The payload can never be processed; retrying is pointless.
    ///
    /// Push transports answer with a client error; pull loops skip and
    /// commit the offset so the poison message is not replayed forever.
    Unprocessable,
    /// A downstream dependency failed; redelivery may succeed.
    Transient,
}

/// A handler error that can tell the transport whether to retry.
pub trait HandlerError: std::error::Error + Send + Sync + 'static {
    /// How the delivering transport should treat this failure.
    fn failure_kind(&self) -> FailureKind;
}

/// Business logic for one message schema.
pub trait MessageHandler: Send + Sync {
    /// The schema this handler consumes.
    type Message: Message;

    /// What a successful handling produces (returned to push callers).
    type Outcome: Serialize + Send;

    /// Handler failure type.
    type Error: HandlerError;

    /// Handle one delivery of a message.
    ///
    /// Must be safe to invoke more than once with the same input: a
    /// duplicate delivery resolves to the same outcome, never a second
    /// side effect and never an error.
    fn handle(
        &self,
        message: Self::Message,
    ) -> impl Future<Output = Result<Self::Outcome, Self::Error>> + Send;
}
