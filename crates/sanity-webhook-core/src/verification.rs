//! The synchronous half of webhook verification.
//!
//! Once the secret is known and the body has been read, the rest of the
//! pipeline is pure computation: parse the header, check the signature and
//! decode the payload. [`verify_request`] runs those steps and produces the
//! verdict together with its [`Diagnostics`].

use std::fmt;

use crate::decoder::PayloadDecoder;
use crate::diagnostics::Diagnostics;
use crate::error::VerifyError;
use crate::header::SignatureHeader;
use crate::secret::Secret;
use crate::signature::verify_signature;

/// States of the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// A request arrived.
    Start,
    /// The request path is one the guard protects.
    PathMatched,
    /// The path is not protected; the request passes through untouched.
    PathNotMatched,
    /// The secret was resolved.
    SecretResolved,
    /// The raw body was read.
    BodyRead,
    /// The signature header was parsed.
    HeaderParsed,
    /// The signature matched.
    SignatureVerified,
    /// The payload was decoded.
    PayloadDecoded,
    /// Terminal success.
    Authenticated,
    /// Terminal failure.
    Rejected,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::PathMatched => "path_matched",
            Self::PathNotMatched => "path_not_matched",
            Self::SecretResolved => "secret_resolved",
            Self::BodyRead => "body_read",
            Self::HeaderParsed => "header_parsed",
            Self::SignatureVerified => "signature_verified",
            Self::PayloadDecoded => "payload_decoded",
            Self::Authenticated => "authenticated",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Verdict and diagnostics for one request.
#[derive(Debug, Clone)]
pub struct Verification {
    /// The decoded payload, or why the request was rejected.
    pub outcome: Result<serde_json::Value, VerifyError>,
    /// What the verifier saw and computed.
    pub diagnostics: Diagnostics,
}

impl Verification {
    /// Reject with `error`, recording it on the diagnostics.
    #[must_use]
    pub fn reject(diagnostics: Diagnostics, error: VerifyError) -> Self {
        tracing::debug!(stage = %Stage::Rejected, kind = %error.kind(), "webhook verification stopped");
        Self {
            diagnostics: diagnostics.with_error(error.clone()),
            outcome: Err(error),
        }
    }

    /// Whether the request was authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Parse the signature header, verify the body and decode the payload.
///
/// `header_values` are every value of the `sanity-webhook-signature` header
/// on the request; anything other than exactly one is a missing header.
pub fn verify_request<I, V>(
    header_values: I,
    body: &[u8],
    secret: &Secret,
    decoder: &dyn PayloadDecoder,
) -> Verification
where
    I: IntoIterator<Item = V>,
    V: AsRef<[u8]>,
{
    let diagnostics = Diagnostics::new()
        .with_secret(secret.clone())
        .with_raw_body(body);

    let header = match SignatureHeader::from_values(header_values) {
        Ok(header) => header,
        Err(error) => return Verification::reject(diagnostics, error),
    };
    tracing::debug!(stage = %Stage::HeaderParsed, timestamp = header.timestamp, "signature header parsed");

    let diagnostics = diagnostics.with_presented(header.hash.as_str(), header.timestamp);
    let computed = match verify_signature(&header.hash, header.timestamp, body, secret) {
        Ok(computed) => computed,
        Err(rejection) => {
            return Verification::reject(
                diagnostics.with_computed_hash(rejection.computed_hash),
                rejection.error,
            )
        }
    };
    tracing::debug!(stage = %Stage::SignatureVerified, "webhook signature verified");

    let diagnostics = diagnostics.with_computed_hash(Some(computed));
    match decoder.decode(body) {
        Ok(payload) => {
            tracing::debug!(stage = %Stage::PayloadDecoded, "webhook payload decoded");
            Verification {
                outcome: Ok(payload),
                diagnostics,
            }
        }
        Err(error) => Verification::reject(diagnostics, error.into()),
    }
}
