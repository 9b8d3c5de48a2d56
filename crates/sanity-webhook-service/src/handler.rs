//! The handler capability.

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

use sanity_webhook_core::VerifyError;

/// Receives the verdict for every protected request.
///
/// When a guard is configured with a handler, the handler's response is final
/// and the request does not continue to the router.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Called with the decoded payload of an authenticated webhook.
    async fn on_authenticated(&self, request: Request, payload: serde_json::Value) -> Response;

    /// Called with the reason a webhook was rejected.
    async fn on_rejected(&self, request: Request, error: VerifyError) -> Response;
}
