//! Webhook receiver.

use axum::Json;
use serde::Serialize;

use sanity_webhook_core::ErrorKind;

use crate::extract::{WebhookDiagnostics, WebhookPayload};

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was authenticated and accepted.
    pub received: bool,
    /// The `_id` of the document the webhook is about, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Why the webhook was rejected, when the guard lets rejections through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

/// Receive a webhook that passed (or, with `halt_on_error` off, failed) the
/// guard.
pub async fn receive(
    diagnostics: WebhookDiagnostics,
    payload: Option<WebhookPayload>,
) -> Json<WebhookResponse> {
    if let Some(error) = diagnostics.error() {
        tracing::info!(kind = %error.kind(), "Recorded rejected webhook");
        return Json(WebhookResponse {
            received: false,
            document_id: None,
            error: Some(error.kind()),
        });
    }

    let document_id = payload
        .as_ref()
        .and_then(|WebhookPayload(value)| value.get("_id"))
        .and_then(|v| v.as_str())
        .map(String::from);

    tracing::info!(document_id = ?document_id, "Received Sanity webhook");

    Json(WebhookResponse {
        received: payload.is_some(),
        document_id,
        error: None,
    })
}
