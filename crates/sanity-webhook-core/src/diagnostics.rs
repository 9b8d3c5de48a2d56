//! Per-request verification diagnostics.
//!
//! A [`Diagnostics`] record captures what the verifier saw and computed so an
//! operator can work out why a webhook was rejected. The secret is kept only
//! as a reference and is never printed or serialized.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::VerifyError;
use crate::secret::Secret;

/// Diagnostic state for one verified (or rejected) request.
#[derive(Clone, Default)]
pub struct Diagnostics {
    hash: Option<String>,
    computed_hash: Option<String>,
    timestamp: Option<i64>,
    raw_body: Option<Vec<u8>>,
    secret: Option<Secret>,
    error: Option<VerifyError>,
}

impl Diagnostics {
    /// An empty record, created when verification of a request begins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resolved secret.
    #[must_use]
    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Record the raw body exactly as received.
    #[must_use]
    pub fn with_raw_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    /// Record the presented hash and timestamp.
    #[must_use]
    pub fn with_presented(mut self, hash: impl Into<String>, timestamp: i64) -> Self {
        self.hash = Some(hash.into());
        self.timestamp = Some(timestamp);
        self
    }

    /// Record the hash computed by the verifier.
    #[must_use]
    pub fn with_computed_hash(mut self, computed_hash: Option<String>) -> Self {
        self.computed_hash = computed_hash;
        self
    }

    /// Mark the request as rejected.
    #[must_use]
    pub fn with_error(mut self, error: VerifyError) -> Self {
        self.error = Some(error);
        self
    }

    /// The hash presented in the signature header.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// The hash computed from the body and secret.
    #[must_use]
    pub fn computed_hash(&self) -> Option<&str> {
        self.computed_hash.as_deref()
    }

    /// The signing timestamp, in milliseconds since the epoch.
    #[must_use]
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// The raw request body.
    #[must_use]
    pub fn raw_body(&self) -> Option<&[u8]> {
        self.raw_body.as_deref()
    }

    /// The secret used for verification. Never log its value.
    #[must_use]
    pub fn secret(&self) -> Option<&Secret> {
        self.secret.as_ref()
    }

    /// The rejection reason, or `None` if the request was authenticated.
    #[must_use]
    pub fn error(&self) -> Option<&VerifyError> {
        self.error.as_ref()
    }

    /// Whether verification succeeded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.error.is_none()
    }

    fn body_text(&self) -> Option<String> {
        self.raw_body
            .as_deref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("hash", &self.hash)
            .field("computed_hash", &self.computed_hash)
            .field("timestamp", &self.timestamp)
            .field("raw_body", &self.body_text())
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("error", &self.error)
            .finish()
    }
}

impl Serialize for Diagnostics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Diagnostics", 6)?;
        state.serialize_field("hash", &self.hash)?;
        state.serialize_field("computed_hash", &self.computed_hash)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("raw_body", &self.body_text())?;
        state.serialize_field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))?;
        match &self.error {
            None => state.serialize_field("error", &false)?,
            Some(error) => state.serialize_field(
                "error",
                &ErrorRecord {
                    kind: error.kind(),
                    message: error.to_string(),
                },
            )?,
        }
        state.end()
    }
}

#[derive(Serialize)]
struct ErrorRecord {
    kind: crate::error::ErrorKind,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected() -> Diagnostics {
        Diagnostics::new()
            .with_secret(Secret::new("super-secret-value"))
            .with_raw_body(br#"{"_id":"resume"}"#.to_vec())
            .with_presented("abc", 1_633_519_811_129)
            .with_computed_hash(Some("xyz".into()))
            .with_error(VerifyError::SignatureMismatch)
    }

    #[test]
    fn debug_redacts_secret() {
        let printed = format!("{:?}", rejected());
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("[REDACTED]"));
        assert!(printed.contains("_id"));
    }

    #[test]
    fn serialize_redacts_secret() {
        let value = serde_json::to_value(rejected()).unwrap();
        assert!(!value.to_string().contains("super-secret-value"));
        assert_eq!(value["secret"], "[REDACTED]");
        assert_eq!(value["hash"], "abc");
        assert_eq!(value["computed_hash"], "xyz");
        assert_eq!(value["timestamp"], 1_633_519_811_129_i64);
        assert_eq!(value["raw_body"], r#"{"_id":"resume"}"#);
        assert_eq!(value["error"]["kind"], "signature_mismatch");
        assert_eq!(value["error"]["message"], "Signature does not match expected");
    }

    #[test]
    fn success_serializes_error_as_false() {
        let diagnostics = Diagnostics::new().with_presented("abc", 1_700_000_000_000);
        assert!(diagnostics.is_authenticated());
        let value = serde_json::to_value(diagnostics).unwrap();
        assert_eq!(value["error"], false);
        assert!(value["secret"].is_null());
    }
}
