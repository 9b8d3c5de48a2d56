//! Service configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use sanity_webhook_core::{Secret, SECRET_ENV_VAR};

use crate::body::{BodyLimits, DEFAULT_CHUNK_LENGTH, DEFAULT_MAX_LENGTH, DEFAULT_READ_TIMEOUT};
use crate::guard::GuardConfig;

/// Default path receiving Sanity webhooks.
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhooks/sanity";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Paths that receive signed webhooks (default: `/webhooks/sanity`).
    pub webhook_paths: Vec<String>,

    /// Webhook secret. When unset, `SANITY_WEBHOOK_SECRET` is read on each
    /// request instead.
    pub webhook_secret: Option<Secret>,

    /// Whether rejected webhooks are answered with a 400 (default: true).
    pub halt_on_error: bool,

    /// Limits for reading webhook bodies.
    pub body_limits: BodyLimits,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Sanity secrets file structure.
#[derive(Debug, Deserialize)]
struct SanitySecrets {
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            webhook_paths: std::env::var("WEBHOOK_PATHS")
                .unwrap_or_else(|_| DEFAULT_WEBHOOK_PATH.into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            webhook_secret: load_webhook_secret(),
            halt_on_error: std::env::var("WEBHOOK_HALT_ON_ERROR")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
            body_limits: BodyLimits {
                max_length: env_parse("WEBHOOK_MAX_BODY_BYTES").unwrap_or(DEFAULT_MAX_LENGTH),
                chunk_length: env_parse("WEBHOOK_READ_CHUNK_BYTES")
                    .unwrap_or(DEFAULT_CHUNK_LENGTH),
                read_timeout: env_parse("WEBHOOK_READ_TIMEOUT_MS")
                    .map_or(DEFAULT_READ_TIMEOUT, Duration::from_millis),
            },
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS").unwrap_or(30),
        }
    }

    /// Guard options derived from this configuration.
    #[must_use]
    pub fn guard_config(&self) -> GuardConfig {
        let config = GuardConfig::new()
            .with_paths(self.webhook_paths.iter().cloned())
            .with_halt_on_error(self.halt_on_error)
            .with_body_limits(self.body_limits);

        match &self.webhook_secret {
            Some(secret) => config.with_static_secret(secret.expose_secret()),
            None => config,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            webhook_paths: vec![DEFAULT_WEBHOOK_PATH.into()],
            webhook_secret: None,
            halt_on_error: true,
            body_limits: BodyLimits::default(),
            request_timeout_seconds: 30,
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load the webhook secret from a secrets file.
///
/// An environment-only secret is not captured here: the guard reads
/// `SANITY_WEBHOOK_SECRET` itself on each request, so rotating the variable
/// needs no restart.
fn load_webhook_secret() -> Option<Secret> {
    let secret_paths = [
        ".secrets/sanity.json",
        "sanity-webhook/.secrets/sanity.json",
        "../.secrets/sanity.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<SanitySecrets>(path) {
            if let Some(secret) = secrets.webhook_secret.filter(|s| !s.is_empty()) {
                tracing::info!(path = %path, "Loaded webhook secret from file");
                return Some(Secret::new(secret));
            }
        }
    }

    tracing::debug!(
        var = SECRET_ENV_VAR,
        "Secrets file not found, webhook secret will be read from the environment"
    );
    None
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_booleans() {
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn default_protects_sanity_path() {
        let config = ServiceConfig::default();
        assert_eq!(config.webhook_paths, vec![DEFAULT_WEBHOOK_PATH.to_string()]);
        assert!(config.halt_on_error);
    }

    #[test]
    fn guard_config_carries_paths() {
        let config = ServiceConfig {
            webhook_paths: vec!["/a".into(), "/b".into()],
            webhook_secret: Some(Secret::new("test")),
            ..ServiceConfig::default()
        };
        let guard = config.guard_config().build().unwrap();
        assert_eq!(guard.paths().collect::<Vec<_>>(), vec!["/a", "/b"]);
    }

    #[test]
    fn reads_secret_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("sanity.json");
        std::fs::write(&file, r#"{"webhook_secret":"from-file"}"#).unwrap();

        let secrets: SanitySecrets = load_secrets_file(file.to_str().unwrap()).unwrap();
        assert_eq!(secrets.webhook_secret.as_deref(), Some("from-file"));
    }

    #[test]
    fn missing_secret_file_is_not_found() {
        let err = load_secrets_file::<SanitySecrets>("does/not/exist.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
