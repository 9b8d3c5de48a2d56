//! Core verification for signed Sanity webhooks.
//!
//! This crate holds the transport-independent pieces of webhook
//! authentication:
//!
//! - **Header parsing**: `SignatureHeader` for `t=<ms>,v1=<hash>` values
//! - **Secrets**: `Secret`, `SecretProvider` and `resolve_secret`
//! - **Signatures**: HMAC-SHA256 over `"{timestamp}.{body}"`, base64url encoded
//! - **Decoding**: `PayloadDecoder` with a JSON default
//! - **Diagnostics**: a per-request record with the secret redacted
//!
//! # Example
//!
//! ```
//! use sanity_webhook_core::{sign, verify_request, JsonDecoder, Secret};
//!
//! let secret = Secret::new("test");
//! let body = br#"{"_id":"resume"}"#;
//! let header = sign(1_633_519_811_129, body, &secret);
//!
//! let verification = verify_request([header.as_str()], body, &secret, &JsonDecoder);
//! assert!(verification.is_authenticated());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod base64url;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod header;
pub mod secret;
pub mod signature;
pub mod verification;

pub use decoder::{DecodeError, JsonDecoder, PayloadDecoder};
pub use diagnostics::Diagnostics;
pub use error::{ErrorKind, Result, VerifyError};
pub use header::{SignatureHeader, SIGNATURE_HEADER};
pub use secret::{
    resolve_secret, EnvSecret, FnSecret, Resolution, Secret, SecretProvider, StaticSecret,
    MAX_RESOLUTION_DEPTH, SECRET_ENV_VAR,
};
pub use signature::{compute_signature, sign, verify_signature, Rejection, MIN_TIMESTAMP_MS};
pub use verification::{verify_request, Stage, Verification};
