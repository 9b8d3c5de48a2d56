//! Common test utilities for sanity-webhook integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;

use sanity_webhook_core::{sign, Secret, SIGNATURE_HEADER};
use sanity_webhook_service::{create_router, AppState, GuardConfig, ServiceConfig};

/// Secret shared by the harness and the signed fixtures.
pub const TEST_SECRET: &str = "test";

/// Path the harness protects.
pub const WEBHOOK_PATH: &str = "/webhooks/sanity";

/// Body of the published reference webhook.
pub const KNOWN_BODY: &str = r#"{"_id":"resume"}"#;

/// Signature header of the published reference webhook.
pub const KNOWN_SIGNATURE: &str = "t=1633519811129,v1=tLa470fx7qkLLEcMOcEUFuBbRSkGujyskxrNXcoh0N0";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
}

impl TestHarness {
    /// Create a harness around the full service router with a fixed secret.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a harness around the full service router.
    pub fn with_config(config: ServiceConfig) -> Self {
        let state = AppState::new(config).expect("Failed to build guard");
        let router: Router = create_router(state);
        Self::with_router(router)
    }

    /// Create a harness around an arbitrary router.
    pub fn with_router(router: Router) -> Self {
        let server = TestServer::new(router).expect("Failed to create test server");
        Self { server }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Service configuration protecting [`WEBHOOK_PATH`] with [`TEST_SECRET`].
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        webhook_secret: Some(Secret::new(TEST_SECRET)),
        ..ServiceConfig::default()
    }
}

/// Guard options protecting [`WEBHOOK_PATH`] with [`TEST_SECRET`].
pub fn test_guard_config() -> GuardConfig {
    GuardConfig::new()
        .with_path(WEBHOOK_PATH)
        .with_static_secret(TEST_SECRET)
}

/// The signature header name.
pub fn signature_header() -> HeaderName {
    HeaderName::from_static(SIGNATURE_HEADER)
}

/// A header value, panicking on invalid input.
pub fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).expect("invalid header value")
}

/// A signature header for `body` signed now-ish with [`TEST_SECRET`].
pub fn signed(timestamp: i64, body: &str) -> HeaderValue {
    header_value(&sign(timestamp, body.as_bytes(), &Secret::new(TEST_SECRET)))
}
