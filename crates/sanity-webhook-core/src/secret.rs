//! Shared-secret handling.
//!
//! A webhook secret is resolved once per request through a [`SecretProvider`].
//! Providers may hand back the secret directly or defer to another provider,
//! which lets callers compute the secret lazily (for example from a tenant
//! lookup) without the guard knowing how.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, VerifyError};

/// Environment variable consulted when no provider is configured.
pub const SECRET_ENV_VAR: &str = "SANITY_WEBHOOK_SECRET";

/// Maximum number of deferred providers followed before giving up.
pub const MAX_RESOLUTION_DEPTH: usize = 8;

/// A webhook secret.
///
/// `Debug` and `Display` always print `[REDACTED]`. The value is only
/// reachable through [`Secret::expose_secret`].
#[derive(Clone)]
pub struct Secret(Arc<str>);

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    /// The raw secret value. Never log the result.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Whether the secret is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// The outcome of asking a provider for the secret.
pub enum Resolution {
    /// The secret itself.
    Value(Secret),
    /// Another provider that must be asked in turn.
    Deferred(Arc<dyn SecretProvider>),
}

impl Resolution {
    /// Defer to another provider.
    pub fn deferred(provider: impl SecretProvider + 'static) -> Self {
        Self::Deferred(Arc::new(provider))
    }
}

impl From<String> for Resolution {
    fn from(value: String) -> Self {
        Self::Value(Secret::new(value))
    }
}

impl From<&str> for Resolution {
    fn from(value: &str) -> Self {
        Self::Value(Secret::new(value))
    }
}

impl From<Secret> for Resolution {
    fn from(secret: Secret) -> Self {
        Self::Value(secret)
    }
}

/// Source of the webhook secret.
pub trait SecretProvider: Send + Sync {
    /// Produce the secret, or a provider that will.
    fn resolve(&self) -> Result<Resolution>;
}

/// A secret fixed at configuration time.
#[derive(Debug, Clone)]
pub struct StaticSecret(Secret);

impl StaticSecret {
    /// Create a provider that always yields `value`.
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(Secret::new(value))
    }
}

impl SecretProvider for StaticSecret {
    fn resolve(&self) -> Result<Resolution> {
        Ok(Resolution::Value(self.0.clone()))
    }
}

/// A secret read from an environment variable on every resolution.
#[derive(Debug, Clone)]
pub struct EnvSecret {
    var: String,
}

impl EnvSecret {
    /// Read the secret from `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSecret {
    fn default() -> Self {
        Self::new(SECRET_ENV_VAR)
    }
}

impl SecretProvider for EnvSecret {
    fn resolve(&self) -> Result<Resolution> {
        match std::env::var(&self.var) {
            Ok(value) if !value.is_empty() => Ok(value.into()),
            _ => {
                tracing::debug!(var = %self.var, "webhook secret variable not set");
                Err(VerifyError::NoSecret)
            }
        }
    }
}

/// A secret computed by a callback at request time.
pub struct FnSecret<F>(F);

impl<F> FnSecret<F>
where
    F: Fn() -> Result<Resolution> + Send + Sync,
{
    /// Wrap a callback.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> SecretProvider for FnSecret<F>
where
    F: Fn() -> Result<Resolution> + Send + Sync,
{
    fn resolve(&self) -> Result<Resolution> {
        (self.0)()
    }
}

impl<F> fmt::Debug for FnSecret<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSecret")
    }
}

/// Resolve a secret, falling back to [`SECRET_ENV_VAR`] when no provider is
/// configured.
///
/// Deferred providers are followed up to [`MAX_RESOLUTION_DEPTH`] hops. Any
/// provider failure, an empty secret, or running out of hops yields
/// [`VerifyError::NoSecret`].
pub fn resolve_secret(provider: Option<&dyn SecretProvider>) -> Result<Secret> {
    let resolution = match provider {
        Some(provider) => provider.resolve(),
        None => EnvSecret::default().resolve(),
    };

    let mut resolution = resolution.map_err(no_secret)?;
    for _ in 0..MAX_RESOLUTION_DEPTH {
        match resolution {
            Resolution::Value(secret) if secret.is_empty() => return Err(VerifyError::NoSecret),
            Resolution::Value(secret) => return Ok(secret),
            Resolution::Deferred(next) => resolution = next.resolve().map_err(no_secret)?,
        }
    }

    tracing::warn!(
        max_depth = MAX_RESOLUTION_DEPTH,
        "webhook secret provider chain too deep"
    );
    Err(VerifyError::NoSecret)
}

fn no_secret(error: VerifyError) -> VerifyError {
    if error != VerifyError::NoSecret {
        tracing::debug!(error = %error, "webhook secret provider failed");
    }
    VerifyError::NoSecret
}
