//! URL-safe base64 without padding.
//!
//! Signature hashes travel in an HTTP header, so they use the `-`/`_`
//! alphabet and never carry `=` padding. Decoding tolerates trailing padding
//! for senders that keep it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::{DecodeError, Engine};

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Decode base64url, with or without trailing padding.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD.decode(input.trim_end_matches('='))
}
