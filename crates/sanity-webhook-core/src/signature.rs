//! HMAC-SHA256 webhook signatures.
//!
//! The signed message is `"{timestamp}.{raw body}"`, keyed with the shared
//! secret, and the digest is carried as unpadded base64url.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::base64url;
use crate::error::VerifyError;
use crate::header::SignatureHeader;
use crate::secret::Secret;

type HmacSha256 = Hmac<Sha256>;

/// Earliest acceptable signing time: 2021-01-01T00:00:00Z in milliseconds.
pub const MIN_TIMESTAMP_MS: i64 = 1_609_459_200_000;

/// A failed signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Why the signature was rejected.
    pub error: VerifyError,
    /// The hash we computed, when the timestamp passed the freshness floor.
    pub computed_hash: Option<String>,
}

/// Compute the base64url HMAC-SHA256 for a body signed at `timestamp`.
///
/// # Panics
///
/// Never in practice: HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn compute_signature(timestamp: i64, body: &[u8], secret: &Secret) -> String {
    // INVARIANT: HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC-SHA256 accepts any key size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);

    base64url::encode(mac.finalize().into_bytes())
}

/// Verify a presented hash against the body and secret.
///
/// Timestamps below [`MIN_TIMESTAMP_MS`] are rejected before any hash is
/// computed. The hash comparison runs in constant time.
pub fn verify_signature(
    hash: &str,
    timestamp: i64,
    body: &[u8],
    secret: &Secret,
) -> Result<String, Rejection> {
    if timestamp < MIN_TIMESTAMP_MS {
        return Err(Rejection {
            error: VerifyError::TimestampTooOld { timestamp },
            computed_hash: None,
        });
    }

    let expected = compute_signature(timestamp, body, secret);
    if constant_time_eq(hash.as_bytes(), expected.as_bytes()) {
        Ok(expected)
    } else {
        Err(Rejection {
            error: VerifyError::SignatureMismatch,
            computed_hash: Some(expected),
        })
    }
}

/// Build the header value a sender attaches to a webhook signed at
/// `timestamp`.
#[must_use]
pub fn sign(timestamp: i64, body: &[u8], secret: &Secret) -> String {
    SignatureHeader {
        timestamp,
        hash: compute_signature(timestamp, body, secret),
    }
    .to_string()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BODY: &[u8] = br#"{"_id":"resume"}"#;

    fn secret() -> Secret {
        Secret::new("test")
    }

    #[test]
    fn computes_known_signature() {
        assert_eq!(
            compute_signature(1_633_519_811_129, BODY, &secret()),
            "tLa470fx7qkLLEcMOcEUFuBbRSkGujyskxrNXcoh0N0"
        );
    }

    #[test]
    fn accepts_known_signature() {
        let computed = verify_signature(
            "tLa470fx7qkLLEcMOcEUFuBbRSkGujyskxrNXcoh0N0",
            1_633_519_811_129,
            BODY,
            &secret(),
        )
        .unwrap();
        assert_eq!(computed, "tLa470fx7qkLLEcMOcEUFuBbRSkGujyskxrNXcoh0N0");
    }

    #[test]
    fn altered_timestamp_is_mismatch() {
        let rejection = verify_signature(
            "tLa470fx7qkLLEcMOcEUFuBbRSkGujyskxrNXcoh0N0",
            1_633_519_811_999,
            BODY,
            &secret(),
        )
        .unwrap_err();
        assert_eq!(rejection.error, VerifyError::SignatureMismatch);
        assert_eq!(
            rejection.computed_hash.as_deref(),
            Some("MvOplWzHD4SnEHitPZJmur5XzUATpQdN4oFX1ndiW7g")
        );
    }

    #[test]
    fn early_timestamp_skips_hashing() {
        let ts = MIN_TIMESTAMP_MS - 1;
        let hash = compute_signature(ts, BODY, &secret());
        let rejection = verify_signature(&hash, ts, BODY, &secret()).unwrap_err();
        assert_eq!(rejection.error, VerifyError::TimestampTooOld { timestamp: ts });
        assert_eq!(rejection.computed_hash, None);
    }

    #[test]
    fn floor_itself_is_accepted() {
        let hash = compute_signature(MIN_TIMESTAMP_MS, BODY, &secret());
        assert!(verify_signature(&hash, MIN_TIMESTAMP_MS, BODY, &secret()).is_ok());
    }

    #[test]
    fn wrong_secret_is_mismatch() {
        let hash = compute_signature(1_633_519_811_129, BODY, &Secret::new("other"));
        let rejection = verify_signature(&hash, 1_633_519_811_129, BODY, &secret()).unwrap_err();
        assert_eq!(rejection.error, VerifyError::SignatureMismatch);
    }

    #[test]
    fn sign_produces_parseable_header() {
        let header: SignatureHeader = sign(1_633_519_811_129, BODY, &secret()).parse().unwrap();
        assert_eq!(header.timestamp, 1_633_519_811_129);
        assert_eq!(header.hash, "tLa470fx7qkLLEcMOcEUFuBbRSkGujyskxrNXcoh0N0");
    }

    proptest! {
        #[test]
        fn signed_bodies_verify(
            secret in "[a-zA-Z0-9]{1,32}",
            timestamp in MIN_TIMESTAMP_MS..4_102_444_800_000i64,
            body in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let secret = Secret::new(secret);
            let hash = compute_signature(timestamp, &body, &secret);
            prop_assert!(verify_signature(&hash, timestamp, &body, &secret).is_ok());
        }

        #[test]
        fn any_bit_flip_is_mismatch(
            timestamp in MIN_TIMESTAMP_MS..4_102_444_800_000i64,
            body in proptest::collection::vec(any::<u8>(), 1..256),
            bit in any::<prop::sample::Index>(),
        ) {
            let secret = secret();
            let hash = compute_signature(timestamp, &body, &secret);

            let mut tampered = body.clone();
            let bit = bit.index(tampered.len() * 8);
            tampered[bit / 8] ^= 1 << (bit % 8);

            let rejection = verify_signature(&hash, timestamp, &tampered, &secret).unwrap_err();
            prop_assert_eq!(rejection.error, VerifyError::SignatureMismatch);
        }

        #[test]
        fn early_timestamps_always_rejected(
            timestamp in i64::MIN..MIN_TIMESTAMP_MS,
            body in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let secret = secret();
            let hash = compute_signature(timestamp, &body, &secret);
            let rejection = verify_signature(&hash, timestamp, &body, &secret).unwrap_err();
            prop_assert_eq!(rejection.error, VerifyError::TimestampTooOld { timestamp });
            prop_assert!(rejection.computed_hash.is_none());
        }
    }
}
