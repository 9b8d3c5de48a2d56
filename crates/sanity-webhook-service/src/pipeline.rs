//! The verification pipeline.
//!
//! Runs the fixed sequence path match → secret → body → header → signature →
//! decode for one request and reports the verdict.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::HeaderValue;
use tracing::Instrument;

use sanity_webhook_core::{
    resolve_secret, verify_request, Diagnostics, PayloadDecoder, SecretProvider, Stage,
    Verification, SIGNATURE_HEADER,
};

use crate::body::{acquire_body, BodyLimits};

/// Result of running the pipeline on one request.
#[derive(Debug)]
pub enum Outcome {
    /// The path is not protected; nothing was read or attached.
    PathNotMatched,
    /// The request was verified or rejected.
    Verified(Verification),
}

/// Orchestrates verification for the protected paths.
pub struct VerificationPipeline {
    paths: BTreeSet<String>,
    secret: Option<Arc<dyn SecretProvider>>,
    limits: BodyLimits,
    decoder: Arc<dyn PayloadDecoder>,
}

impl VerificationPipeline {
    /// Create a pipeline.
    pub fn new(
        paths: BTreeSet<String>,
        secret: Option<Arc<dyn SecretProvider>>,
        limits: BodyLimits,
        decoder: Arc<dyn PayloadDecoder>,
    ) -> Self {
        Self {
            paths,
            secret,
            limits,
            decoder,
        }
    }

    /// The protected paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Whether `path` is protected.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Run the pipeline.
    ///
    /// The request is handed back with its body restored so it can continue
    /// downstream.
    pub async fn run(&self, request: Request) -> (Request, Outcome) {
        tracing::trace!(stage = %Stage::Start, method = %request.method(), "webhook guard invoked");
        if !self.matches(request.uri().path()) {
            tracing::trace!(stage = %Stage::PathNotMatched, path = %request.uri().path(), "passing through");
            return (request, Outcome::PathNotMatched);
        }

        let span = tracing::info_span!("webhook", path = %request.uri().path());
        let (request, verification) = self.verify(request).instrument(span).await;
        (request, Outcome::Verified(verification))
    }

    async fn verify(&self, request: Request) -> (Request, Verification) {
        tracing::debug!(stage = %Stage::PathMatched, "verifying webhook");
        let diagnostics = Diagnostics::new();

        let secret = match resolve_secret(self.secret.as_deref()) {
            Ok(secret) => secret,
            Err(e) => return (request, reject(diagnostics, e)),
        };
        tracing::debug!(stage = %Stage::SecretResolved, "webhook secret resolved");
        let diagnostics = diagnostics.with_secret(secret.clone());

        let (request, body) = acquire_body(request, &self.limits).await;
        let body = match body {
            Ok(body) => body,
            Err(e) => return (request, reject(diagnostics, e.into())),
        };
        tracing::debug!(stage = %Stage::BodyRead, bytes = body.len(), "webhook body read");

        let header_values = request
            .headers()
            .get_all(SIGNATURE_HEADER)
            .iter()
            .map(HeaderValue::as_bytes);
        let verification = verify_request(header_values, &body, &secret, self.decoder.as_ref());
        log_verdict(&verification);

        (request, verification)
    }
}

fn reject(diagnostics: Diagnostics, error: sanity_webhook_core::VerifyError) -> Verification {
    let verification = Verification::reject(diagnostics, error);
    log_verdict(&verification);
    verification
}

fn log_verdict(verification: &Verification) {
    let diagnostics = &verification.diagnostics;
    match &verification.outcome {
        Ok(_) => {
            let signed_at = diagnostics
                .timestamp()
                .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis);
            let age_ms = signed_at.map(|at| (chrono::Utc::now() - at).num_milliseconds());
            tracing::info!(
                stage = %Stage::Authenticated,
                signed_at = ?signed_at,
                age_ms = ?age_ms,
                "webhook authenticated"
            );
        }
        Err(e) => {
            tracing::warn!(
                stage = %Stage::Rejected,
                kind = %e.kind(),
                error = %e,
                timestamp = ?diagnostics.timestamp(),
                "webhook rejected"
            );
        }
    }
}
