//! Error types for webhook verification.

use serde::Serialize;

/// Result type for webhook verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Message used when no secret could be resolved.
pub const NO_SECRET_MESSAGE: &str = "No secret configured";

/// Message used when the signature header is absent, duplicated or malformed.
pub const MISSING_HEADER_MESSAGE: &str = "Could not find valid webhook signature header";

/// Message used when the presented signature differs from the computed one.
pub const SIGNATURE_MISMATCH_MESSAGE: &str = "Signature does not match expected";

/// Message used when a decoder error cannot be rendered as plain text.
pub const GENERIC_DECODE_MESSAGE: &str = "decoding error";

/// Errors that can reject an inbound webhook.
///
/// Every variant is request-local. The `Display` output is the exact message
/// surfaced to the sender in the JSON error response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// No literal, provider or process-wide secret yielded a value.
    #[error("No secret configured")]
    NoSecret,

    /// The request body could not be read within the configured limits.
    #[error("{0}")]
    BodyRead(String),

    /// The signature header is absent, duplicated or malformed.
    #[error("Could not find valid webhook signature header")]
    MissingHeader,

    /// The signed timestamp is below the freshness floor.
    #[error("Timestamp {timestamp} is too early to be a valid webhook")]
    TimestampTooOld {
        /// The rejected timestamp, in milliseconds since the epoch.
        timestamp: i64,
    },

    /// The computed HMAC does not match the presented hash.
    #[error("Signature does not match expected")]
    SignatureMismatch,

    /// The payload decoder rejected the verified body.
    #[error("{0}")]
    Decode(String),
}

impl VerifyError {
    /// The classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSecret => ErrorKind::NoSecret,
            Self::BodyRead(_) => ErrorKind::BodyReadFailure,
            Self::MissingHeader => ErrorKind::MissingHeader,
            Self::TimestampTooOld { .. } => ErrorKind::TimestampTooOld,
            Self::SignatureMismatch => ErrorKind::SignatureMismatch,
            Self::Decode(_) => ErrorKind::DecodeFailure,
        }
    }
}

/// Classification of a rejected webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No secret could be resolved.
    NoSecret,
    /// The body could not be read.
    BodyReadFailure,
    /// The signature header is unusable.
    MissingHeader,
    /// The timestamp is below the freshness floor.
    TimestampTooOld,
    /// The signature does not match.
    SignatureMismatch,
    /// The payload could not be decoded.
    DecodeFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoSecret => "no_secret",
            Self::BodyReadFailure => "body_read_failure",
            Self::MissingHeader => "missing_header",
            Self::TimestampTooOld => "timestamp_too_old",
            Self::SignatureMismatch => "signature_mismatch",
            Self::DecodeFailure => "decode_failure",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_wire_format() {
        assert_eq!(VerifyError::NoSecret.to_string(), NO_SECRET_MESSAGE);
        assert_eq!(VerifyError::MissingHeader.to_string(), MISSING_HEADER_MESSAGE);
        assert_eq!(
            VerifyError::SignatureMismatch.to_string(),
            SIGNATURE_MISMATCH_MESSAGE
        );
        assert_eq!(
            VerifyError::TimestampTooOld { timestamp: 1234 }.to_string(),
            "Timestamp 1234 is too early to be a valid webhook"
        );
        assert_eq!(
            VerifyError::BodyRead("connection reset".into()).to_string(),
            "connection reset"
        );
    }

    #[test]
    fn kinds_serialize_as_snake_case() {
        let kind = VerifyError::TimestampTooOld { timestamp: 1 }.kind();
        assert_eq!(serde_json::to_value(kind).unwrap(), "timestamp_too_old");
        assert_eq!(ErrorKind::BodyReadFailure.to_string(), "body_read_failure");
    }
}
