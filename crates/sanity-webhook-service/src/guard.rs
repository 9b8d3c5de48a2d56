//! Guard configuration.
//!
//! A [`GuardConfig`] collects the recognized options and is validated once at
//! startup into an immutable [`WebhookGuard`] shared by every request.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sanity_webhook_core::{
    FnSecret, JsonDecoder, PayloadDecoder, Resolution, SecretProvider, StaticSecret,
};

use crate::body::BodyLimits;
use crate::handler::WebhookHandler;
use crate::pipeline::VerificationPipeline;

/// Errors detected while validating a [`GuardConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A webhook path does not start with `/` or contains a route parameter.
    #[error("webhook path must be an exact path starting with '/': {0:?}")]
    InvalidPath(String),

    /// A body limit is zero or inconsistent.
    #[error("invalid body limits: {0}")]
    InvalidBodyLimits(String),
}

/// Options for a [`WebhookGuard`].
#[derive(Clone)]
pub struct GuardConfig {
    paths: Vec<String>,
    secret: Option<Arc<dyn SecretProvider>>,
    halt_on_error: bool,
    body_limits: BodyLimits,
    decoder: Arc<dyn PayloadDecoder>,
    handler: Option<Arc<dyn WebhookHandler>>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            secret: None,
            halt_on_error: true,
            body_limits: BodyLimits::default(),
            decoder: Arc::new(JsonDecoder),
            handler: None,
        }
    }
}

impl fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardConfig")
            .field("paths", &self.paths)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("halt_on_error", &self.halt_on_error)
            .field("body_limits", &self.body_limits)
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

impl GuardConfig {
    /// Create a configuration with default values and no paths.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Protect one more path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Protect every path in `paths`.
    #[must_use]
    pub fn with_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Use `provider` to resolve the secret on each request.
    ///
    /// Without a provider the guard reads `SANITY_WEBHOOK_SECRET` from the
    /// environment at request time.
    #[must_use]
    pub fn with_secret(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.secret = Some(Arc::new(provider));
        self
    }

    /// Use a fixed secret.
    #[must_use]
    pub fn with_static_secret(self, secret: impl Into<Arc<str>>) -> Self {
        self.with_secret(StaticSecret::new(secret))
    }

    /// Compute the secret with a callback on each request.
    #[must_use]
    pub fn with_secret_fn<F>(self, f: F) -> Self
    where
        F: Fn() -> sanity_webhook_core::Result<Resolution> + Send + Sync + 'static,
    {
        self.with_secret(FnSecret::new(f))
    }

    /// Whether a rejected request is answered with a 400 (default `true`).
    #[must_use]
    pub fn with_halt_on_error(mut self, halt_on_error: bool) -> Self {
        self.halt_on_error = halt_on_error;
        self
    }

    /// Replace all body limits.
    #[must_use]
    pub fn with_body_limits(mut self, limits: BodyLimits) -> Self {
        self.body_limits = limits;
        self
    }

    /// Set the maximum body size.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.body_limits.max_length = max_length;
        self
    }

    /// Set the buffer growth increment.
    #[must_use]
    pub fn with_chunk_length(mut self, chunk_length: usize) -> Self {
        self.body_limits.chunk_length = chunk_length;
        self
    }

    /// Set the per-read deadline.
    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.body_limits.read_timeout = read_timeout;
        self
    }

    /// Decode verified bodies with `decoder` instead of JSON.
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl PayloadDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Hand verdicts to `handler` instead of the default dispatch.
    #[must_use]
    pub fn with_handler(mut self, handler: impl WebhookHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Validate the configuration and build the guard.
    pub fn build(self) -> Result<WebhookGuard, ConfigError> {
        if let Some(path) = self.paths.iter().find(|p| !is_exact_path(p)) {
            return Err(ConfigError::InvalidPath(path.clone()));
        }

        let limits = self.body_limits;
        if limits.max_length == 0 || limits.chunk_length == 0 {
            return Err(ConfigError::InvalidBodyLimits(
                "max_length and chunk_length must be non-zero".into(),
            ));
        }
        if limits.chunk_length > limits.max_length {
            return Err(ConfigError::InvalidBodyLimits(format!(
                "chunk_length {} exceeds max_length {}",
                limits.chunk_length, limits.max_length
            )));
        }
        if limits.read_timeout.is_zero() {
            return Err(ConfigError::InvalidBodyLimits(
                "read_timeout must be non-zero".into(),
            ));
        }

        let paths: BTreeSet<String> = self.paths.into_iter().collect();
        Ok(WebhookGuard {
            pipeline: VerificationPipeline::new(paths, self.secret, limits, self.decoder),
            halt_on_error: self.halt_on_error,
            handler: self.handler,
        })
    }
}

/// Whether `path` is absolute and free of `:param` or `*wildcard` segments.
///
/// The pipeline matches request paths literally, so a parameterized route
/// would be served without ever being verified.
fn is_exact_path(path: &str) -> bool {
    path.starts_with('/')
        && path
            .split('/')
            .all(|segment| !segment.starts_with([':', '*', '{']))
}

/// A validated, immutable webhook guard.
pub struct WebhookGuard {
    pipeline: VerificationPipeline,
    halt_on_error: bool,
    handler: Option<Arc<dyn WebhookHandler>>,
}

impl WebhookGuard {
    /// The verification pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &VerificationPipeline {
        &self.pipeline
    }

    /// The protected paths, sorted and deduplicated.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.pipeline.paths()
    }

    /// Whether the guard protects any path at all.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.pipeline.paths().next().is_none()
    }

    /// Whether rejected requests are answered with a 400.
    #[must_use]
    pub fn halt_on_error(&self) -> bool {
        self.halt_on_error
    }

    /// The configured handler, if any.
    #[must_use]
    pub fn handler(&self) -> Option<&dyn WebhookHandler> {
        self.handler.as_deref()
    }
}

impl fmt::Debug for WebhookGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookGuard")
            .field("paths", &self.paths().collect::<Vec<_>>())
            .field("halt_on_error", &self.halt_on_error)
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}
