//! Parsing of the `sanity-webhook-signature` header.
//!
//! The header value has the form `t=<unix-ms>,v1=<base64url-hash>`. A single
//! space may stand in for the comma, and surrounding whitespace is ignored.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VerifyError};

/// Name of the header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "sanity-webhook-signature";

/// A parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signing time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The presented base64url hash.
    pub hash: String,
}

impl SignatureHeader {
    /// Parse the header from every value the request carried for it.
    ///
    /// Exactly one value must be present. Zero or several occurrences are
    /// treated as a missing header, as is a value that is not UTF-8.
    pub fn from_values<I, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        let mut values = values.into_iter();
        let (Some(value), None) = (values.next(), values.next()) else {
            return Err(VerifyError::MissingHeader);
        };

        let value = std::str::from_utf8(value.as_ref()).map_err(|_| VerifyError::MissingHeader)?;
        value.parse()
    }
}

impl FromStr for SignatureHeader {
    type Err = VerifyError;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();

        value
            .match_indices("t=")
            .find_map(|(start, _)| match_at(&value[start + 2..]))
            .ok_or(VerifyError::MissingHeader)
    }
}

impl fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={},v1={}", self.timestamp, self.hash)
    }
}

/// Match `(\d+)[,\s]v1=(\S+)` at the start of `rest`.
fn match_at(rest: &str) -> Option<SignatureHeader> {
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let (timestamp, rest) = rest.split_at(digits);
    let separator = *rest.as_bytes().first()?;
    if separator != b',' && !separator.is_ascii_whitespace() {
        return None;
    }

    let rest = rest[1..].strip_prefix("v1=")?;
    let hash_len = rest
        .bytes()
        .take_while(|b| !b.is_ascii_whitespace())
        .count();
    if hash_len == 0 {
        return None;
    }

    Some(SignatureHeader {
        timestamp: timestamp.trim().parse().ok()?,
        hash: rest[..hash_len].trim().to_string(),
    })
}
