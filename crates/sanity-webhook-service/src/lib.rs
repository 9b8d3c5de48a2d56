//! Sanity webhook receiver built on Axum.
//!
//! This crate wires the verification primitives of `sanity-webhook-core` into
//! an HTTP stack:
//!
//! - **Body reading** bounded by size and per-read deadline
//! - **Verification pipeline** running secret → body → header → signature → decode
//! - **Dispatch middleware** that halts, delegates to a handler, or annotates
//!   the request with the verdict
//! - **Extractors** for the decoded payload and the diagnostic record
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::routing::post;
//! use axum::Router;
//! use sanity_webhook_service::{protect, GuardConfig, WebhookPayload};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let guard = GuardConfig::new()
//!     .with_path("/webhooks/sanity")
//!     .with_static_secret("my-webhook-secret")
//!     .build()?;
//!
//! let app: Router = protect(
//!     Router::new().route(
//!         "/webhooks/sanity",
//!         post(|WebhookPayload(payload): WebhookPayload| async move { payload.to_string() }),
//!     ),
//!     Arc::new(guard),
//! );
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unused_async)]

pub mod body;
pub mod config;
pub mod error;
pub mod extract;
pub mod guard;
pub mod handler;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use body::{BodyLimits, BodyReadError, RawBody};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use extract::{diagnostics, WebhookDiagnostics, WebhookPayload};
pub use guard::{ConfigError, GuardConfig, WebhookGuard};
pub use handler::WebhookHandler;
pub use middleware::{protect, webhook_guard};
pub use pipeline::{Outcome, VerificationPipeline};
pub use routes::create_router;
pub use state::AppState;
