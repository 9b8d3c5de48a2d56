//! Size- and time-bounded request body acquisition.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::header::CONTENT_LENGTH;
use futures::StreamExt;

use sanity_webhook_core::VerifyError;

/// Default maximum body size (8 MB).
pub const DEFAULT_MAX_LENGTH: usize = 8_000_000;

/// Default buffer growth increment (1 MB).
pub const DEFAULT_CHUNK_LENGTH: usize = 1_000_000;

/// Default deadline for each read from the transport.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Limits applied while reading a webhook body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimits {
    /// Maximum total body size in bytes.
    pub max_length: usize,
    /// Bytes reserved in the buffer per read.
    pub chunk_length: usize,
    /// Deadline for each individual read.
    pub read_timeout: Duration,
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            chunk_length: DEFAULT_CHUNK_LENGTH,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// The raw body of a request that has already been read from the wire.
///
/// Attached to the request extensions after the first read so later stages
/// reuse the bytes instead of reading the transport again.
#[derive(Debug, Clone)]
pub struct RawBody(pub Bytes);

/// Errors that can occur while reading a request body.
#[derive(Debug, thiserror::Error)]
pub enum BodyReadError {
    /// The body is larger than the configured maximum.
    #[error("request body exceeds {limit} bytes")]
    TooLarge {
        /// The configured maximum.
        limit: usize,
    },

    /// The transport did not produce data in time.
    #[error("timed out reading request body after {}ms", .after.as_millis())]
    Timeout {
        /// The per-read deadline that elapsed.
        after: Duration,
    },

    /// The transport failed.
    #[error("failed to read request body: {0}")]
    Transport(String),
}

impl From<BodyReadError> for VerifyError {
    fn from(error: BodyReadError) -> Self {
        Self::BodyRead(error.to_string())
    }
}

/// Read a body stream into one contiguous buffer.
pub async fn read_body(body: Body, limits: &BodyLimits) -> Result<Bytes, BodyReadError> {
    let mut stream = body.into_data_stream();
    let mut buf: Vec<u8> = Vec::new();

    loop {
        let next = tokio::time::timeout(limits.read_timeout, stream.next())
            .await
            .map_err(|_| BodyReadError::Timeout {
                after: limits.read_timeout,
            })?;

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| BodyReadError::Transport(e.to_string()))?;

        let remaining = limits.max_length - buf.len();
        if chunk.len() > remaining {
            return Err(BodyReadError::TooLarge {
                limit: limits.max_length,
            });
        }
        if buf.capacity() - buf.len() < chunk.len() {
            buf.reserve(chunk.len().max(limits.chunk_length).min(remaining));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buf))
}

/// Take the raw body of `request`, leaving a replayable copy behind.
///
/// A [`RawBody`] extension from an earlier stage is reused as-is. Otherwise
/// the body is read under `limits`, put back on the request, and recorded as
/// a [`RawBody`]. On failure the request is returned with an empty body.
pub async fn acquire_body(
    request: Request,
    limits: &BodyLimits,
) -> (Request, Result<Bytes, BodyReadError>) {
    let materialized = request.extensions().get::<RawBody>().map(|raw| raw.0.clone());
    if let Some(bytes) = materialized {
        return (request, Ok(bytes));
    }

    if let Some(declared) = declared_length(&request) {
        if declared > limits.max_length {
            tracing::debug!(declared, limit = limits.max_length, "content-length over limit");
            return (
                request,
                Err(BodyReadError::TooLarge {
                    limit: limits.max_length,
                }),
            );
        }
    }

    let (mut parts, body) = request.into_parts();
    match read_body(body, limits).await {
        Ok(bytes) => {
            parts.extensions.insert(RawBody(bytes.clone()));
            (Request::from_parts(parts, Body::from(bytes.clone())), Ok(bytes))
        }
        Err(e) => (Request::from_parts(parts, Body::empty()), Err(e)),
    }
}

fn declared_length(request: &Request) -> Option<usize> {
    request
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http;

    fn limits(max_length: usize) -> BodyLimits {
        BodyLimits {
            max_length,
            chunk_length: 4,
            read_timeout: Duration::from_millis(50),
        }
    }

    fn chunked(chunks: &[&'static str]) -> Body {
        let chunks: Vec<Result<Bytes, std::io::Error>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        Body::from_stream(futures::stream::iter(chunks))
    }

    #[tokio::test]
    async fn accumulates_chunks_in_order() {
        let body = chunked(&["{\"_id\"", ":", "\"resume\"}"]);
        let bytes = read_body(body, &limits(1024)).await.unwrap();
        assert_eq!(&bytes[..], br#"{"_id":"resume"}"#);
    }

    #[tokio::test]
    async fn body_at_limit_is_accepted() {
        let bytes = read_body(chunked(&["abcd", "efgh"]), &limits(8)).await.unwrap();
        assert_eq!(bytes.len(), 8);
    }

    #[tokio::test]
    async fn body_over_limit_is_rejected() {
        let err = read_body(chunked(&["abcd", "efghi"]), &limits(8))
            .await
            .unwrap_err();
        assert!(matches!(err, BodyReadError::TooLarge { limit: 8 }));
        assert_eq!(err.to_string(), "request body exceeds 8 bytes");
    }

    #[tokio::test]
    async fn transport_error_is_reported() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "peer reset")),
        ];
        let err = read_body(Body::from_stream(futures::stream::iter(chunks)), &limits(64))
            .await
            .unwrap_err();
        assert!(matches!(err, BodyReadError::Transport(_)));
        assert!(err.to_string().contains("peer reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_transport_times_out() {
        let stalled = futures::stream::pending::<Result<Bytes, std::io::Error>>();
        let err = read_body(Body::from_stream(stalled), &limits(64))
            .await
            .unwrap_err();
        assert!(matches!(err, BodyReadError::Timeout { .. }));
        assert_eq!(err.to_string(), "timed out reading request body after 50ms");
    }

    #[tokio::test]
    async fn acquire_restores_body_and_records_raw_body() {
        let request = http::Request::builder()
            .uri("/webhooks/sanity")
            .body(Body::from("payload"))
            .unwrap();

        let (request, bytes) = acquire_body(request, &limits(64)).await;
        assert_eq!(&bytes.unwrap()[..], b"payload");
        assert!(request.extensions().get::<RawBody>().is_some());

        let replay = read_body(request.into_body(), &limits(64)).await.unwrap();
        assert_eq!(&replay[..], b"payload");
    }

    #[tokio::test]
    async fn acquire_reuses_materialized_body() {
        let mut request = http::Request::builder()
            .uri("/webhooks/sanity")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(RawBody(Bytes::from_static(b"already read")));

        let (_, bytes) = acquire_body(request, &limits(64)).await;
        assert_eq!(&bytes.unwrap()[..], b"already read");
    }

    #[tokio::test]
    async fn acquire_rejects_declared_oversize_body() {
        let request = http::Request::builder()
            .uri("/webhooks/sanity")
            .header(CONTENT_LENGTH, "100")
            .body(Body::from("small"))
            .unwrap();

        let (_, bytes) = acquire_body(request, &limits(16)).await;
        assert!(matches!(bytes, Err(BodyReadError::TooLarge { limit: 16 })));
    }
}
