//! Webhook dispatch middleware.
//!
//! Runs the [`VerificationPipeline`](crate::pipeline::VerificationPipeline)
//! for each request and acts on the verdict: hand it to the configured
//! handler, halt with a 400, or attach it to the request and continue.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;

use sanity_webhook_core::Verification;

use crate::error::ApiError;
use crate::extract::WebhookPayload;
use crate::guard::WebhookGuard;
use crate::pipeline::Outcome;

/// Protect every route of `router` with `guard`.
///
/// Only the guard's configured paths are verified; all other requests pass
/// through untouched.
pub fn protect<S>(router: Router<S>, guard: Arc<WebhookGuard>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(guard, webhook_guard))
}

/// Axum middleware that verifies webhook signatures.
///
/// The diagnostic record of every verified or rejected request is attached to
/// the request extensions before the request continues.
pub async fn webhook_guard(
    State(guard): State<Arc<WebhookGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut request, outcome) = guard.pipeline().run(request).await;
    let Verification {
        outcome,
        diagnostics,
    } = match outcome {
        Outcome::PathNotMatched => return next.run(request).await,
        Outcome::Verified(verification) => verification,
    };
    request.extensions_mut().insert(diagnostics);

    match outcome {
        Ok(payload) => {
            if let Some(handler) = guard.handler() {
                return handler.on_authenticated(request, payload).await;
            }
            request.extensions_mut().insert(WebhookPayload(payload));
            next.run(request).await
        }
        Err(error) => {
            if let Some(handler) = guard.handler() {
                return handler.on_rejected(request, error).await;
            }
            if guard.halt_on_error() {
                return ApiError::Webhook(error).into_response();
            }
            tracing::debug!(kind = %error.kind(), "continuing with rejected webhook");
            next.run(request).await
        }
    }
}
