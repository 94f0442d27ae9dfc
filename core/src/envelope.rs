//! Push-delivery envelope.
//!
//! Push-style transports deliver messages as an HTTP POST whose body wraps
//! the payload in an envelope: `{"message": {"data": "<base64>", ...},
//! "subscription": ...}`. The payload itself is the base64-encoded tagged
//! JSON produced by [`crate::codec::encode`].

use crate::codec::MessageError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// The inner delivery record of a push envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Base64-encoded message payload.
    pub data: String,
    /// Transport-assigned delivery identifier, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Transport publish timestamp, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
}

/// Envelope wrapping one pushed message delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// The delivered message.
    pub message: PushMessage,
    /// The subscription that triggered this delivery, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

impl PushEnvelope {
    /// Wrap a raw payload for delivery. Used by tests and local tooling.
    #[must_use]
    pub fn wrap(payload: &[u8]) -> Self {
        Self {
            message: PushMessage {
                data: STANDARD.encode(payload),
                message_id: None,
                publish_time: None,
            },
            subscription: None,
        }
    }

    /// Decode the base64 payload carried by this envelope.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidEnvelope`] if `data` is not valid
    /// base64 or decodes to an empty payload.
    pub fn payload(&self) -> Result<Vec<u8>, MessageError> {
        let bytes = STANDARD
            .decode(&self.message.data)
            .map_err(|e| MessageError::InvalidEnvelope(format!("invalid base64 payload: {e}")))?;
        if bytes.is_empty() {
            return Err(MessageError::InvalidEnvelope("empty payload".to_string()));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)] // Panics: wrap/payload round trip is lossless
    fn payload_round_trips_through_base64() {
        let envelope = PushEnvelope::wrap(b"{\"type\":\"x\"}");
        assert_eq!(envelope.payload().unwrap(), b"{\"type\":\"x\"}");
    }

    #[test]
    fn payload_rejects_invalid_base64() {
        let envelope = PushEnvelope {
            message: PushMessage {
                data: "!!!not-base64!!!".to_string(),
                message_id: None,
                publish_time: None,
            },
            subscription: None,
        };
        assert!(matches!(
            envelope.payload(),
            Err(MessageError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn payload_rejects_empty_data() {
        let envelope = PushEnvelope::wrap(b"");
        assert!(matches!(
            envelope.payload(),
            Err(MessageError::InvalidEnvelope(_))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)] // Panics: literal JSON is a valid envelope
    fn envelope_parses_transport_shape() {
        let raw = serde_json::json!({
            "message": {
                "data": STANDARD.encode(b"hello"),
                "message_id": "12345",
                "publish_time": "2025-03-09T12:00:00Z"
            },
            "subscription": "projects/demo/subscriptions/create-order-command"
        });
        let envelope: PushEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(envelope.message.message_id.as_deref(), Some("12345"));
        assert_eq!(envelope.payload().unwrap(), b"hello");
    }
}
