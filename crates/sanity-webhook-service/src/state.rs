//! Application state.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::guard::{ConfigError, WebhookGuard};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// The webhook guard protecting the configured paths.
    pub guard: Arc<WebhookGuard>,
}

impl AppState {
    /// Create application state, building the guard from `config`.
    pub fn new(config: ServiceConfig) -> Result<Self, ConfigError> {
        let guard = config.guard_config().build()?;
        Ok(Self::with_guard(config, guard))
    }

    /// Create application state around an already built guard.
    #[must_use]
    pub fn with_guard(config: ServiceConfig, guard: WebhookGuard) -> Self {
        if guard.is_passthrough() {
            tracing::warn!("No webhook paths configured - signature verification is disabled");
        } else {
            tracing::info!(
                paths = ?guard.paths().collect::<Vec<_>>(),
                halt_on_error = guard.halt_on_error(),
                "Webhook signature verification enabled"
            );
        }

        if config.webhook_secret.is_none() {
            tracing::info!("Webhook secret will be read from SANITY_WEBHOOK_SECRET per request");
        }

        Self {
            config,
            guard: Arc::new(guard),
        }
    }
}
