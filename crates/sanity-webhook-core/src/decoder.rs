//! Payload decoding for verified webhook bodies.

use crate::error::{VerifyError, GENERIC_DECODE_MESSAGE};

/// Error returned by a [`PayloadDecoder`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .message.as_deref().unwrap_or(GENERIC_DECODE_MESSAGE))]
pub struct DecodeError {
    message: Option<String>,
}

impl DecodeError {
    /// A decode error whose message is safe to show to the sender.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A decode error whose cause must not be surfaced.
    #[must_use]
    pub const fn opaque() -> Self {
        Self { message: None }
    }
}

impl From<DecodeError> for VerifyError {
    fn from(error: DecodeError) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Turns a verified raw body into structured data.
pub trait PayloadDecoder: Send + Sync {
    /// Decode `body`. Only called after the signature has been verified.
    fn decode(&self, body: &[u8]) -> Result<serde_json::Value, DecodeError>;
}

/// The default decoder: the body must be a JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl PayloadDecoder for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<serde_json::Value, DecodeError> {
        serde_json::from_slice(body).map_err(|e| DecodeError::new(e.to_string()))
    }
}
