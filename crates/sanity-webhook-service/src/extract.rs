//! Extractors for handlers behind the webhook guard.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Request;

use sanity_webhook_core::Diagnostics;

use crate::error::ApiError;

/// The decoded payload of an authenticated webhook.
///
/// Extraction fails with the rejection reason when the guard rejected the
/// request but did not halt it, and with an internal error when the route is
/// not behind the guard at all.
#[derive(Debug, Clone)]
pub struct WebhookPayload(pub serde_json::Value);

#[async_trait]
impl<S> FromRequestParts<S> for WebhookPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(payload) = parts.extensions.get::<Self>() {
            return Ok(payload.clone());
        }

        match parts
            .extensions
            .get::<Diagnostics>()
            .and_then(Diagnostics::error)
        {
            Some(error) => Err(ApiError::Webhook(error.clone())),
            None => Err(ApiError::Internal(
                "webhook payload missing; route is not behind the webhook guard".into(),
            )),
        }
    }
}

/// The diagnostic record for the current request, if the guard verified it.
#[derive(Debug, Clone)]
pub struct WebhookDiagnostics(pub Option<Diagnostics>);

impl WebhookDiagnostics {
    /// The rejection reason, if the request was rejected.
    #[must_use]
    pub fn error(&self) -> Option<&sanity_webhook_core::VerifyError> {
        self.0.as_ref().and_then(Diagnostics::error)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for WebhookDiagnostics
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Diagnostics>().cloned()))
    }
}

/// The diagnostic record attached to `request`, if any.
pub fn diagnostics<B>(request: &Request<B>) -> Option<&Diagnostics> {
    request.extensions().get::<Diagnostics>()
}
