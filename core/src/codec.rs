//! Strict JSON codec for tagged message schemas.
//!
//! The wire form of every [`Message`] is its JSON serialization with an
//! injected `"type"` field. Decoding verifies the tag before touching the
//! rest of the payload: a missing or mismatching tag is rejected outright,
//! which is the consumer-boundary contract of this pipeline (no duck-typed
//! payloads).

use crate::message::Message;
use serde_json::Value;
use thiserror::Error;

/// Field carrying the schema tag on the wire.
pub const TYPE_FIELD: &str = "type";

/// Errors raised while encoding or decoding message payloads.
#[derive(Error, Debug)]
pub enum MessageError {
    /// Payload could not be serialized to JSON.
    #[error("failed to serialize message: {0}")]
    Serialization(String),

    /// Payload was not valid JSON or did not match the schema.
    #[error("failed to deserialize message: {0}")]
    Deserialization(String),

    /// Payload had no `type` tag.
    #[error("message payload has no '{TYPE_FIELD}' field")]
    MissingType,

    /// Payload was tagged with a different schema than the consumer expects.
    #[error("unexpected message type: expected '{expected}', got '{actual}'")]
    UnexpectedType {
        /// The schema the consumer decodes.
        expected: &'static str,
        /// The tag found on the wire.
        actual: String,
    },

    /// The delivery envelope was malformed (bad base64, empty payload).
    #[error("invalid delivery envelope: {0}")]
    InvalidEnvelope(String),
}

/// Encode a message into its tagged JSON wire form.
///
/// # Errors
///
/// Returns [`MessageError::Serialization`] if the message does not serialize
/// to a JSON object (tagged schemas are always objects).
pub fn encode<M: Message>(message: &M) -> Result<Vec<u8>, MessageError> {
    let mut value =
        serde_json::to_value(message).map_err(|e| MessageError::Serialization(e.to_string()))?;

    let Some(object) = value.as_object_mut() else {
        return Err(MessageError::Serialization(format!(
            "message '{}' did not serialize to a JSON object",
            M::MESSAGE_TYPE
        )));
    };
    object.insert(TYPE_FIELD.to_string(), Value::String(M::MESSAGE_TYPE.to_string()));

    serde_json::to_vec(&value).map_err(|e| MessageError::Serialization(e.to_string()))
}

/// Decode a tagged JSON payload into a message, rejecting mismatched tags.
///
/// # Errors
///
/// - [`MessageError::Deserialization`] for malformed JSON or schema-invalid
///   payloads.
/// - [`MessageError::MissingType`] when no tag is present.
/// - [`MessageError::UnexpectedType`] when the tag names another schema.
pub fn decode<M: Message>(payload: &[u8]) -> Result<M, MessageError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| MessageError::Deserialization(e.to_string()))?;

    let Some(actual) = value.get(TYPE_FIELD).and_then(Value::as_str) else {
        return Err(MessageError::MissingType);
    };
    if actual != M::MESSAGE_TYPE {
        return Err(MessageError::UnexpectedType {
            expected: M::MESSAGE_TYPE,
            actual: actual.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| MessageError::Deserialization(e.to_string()))
}
