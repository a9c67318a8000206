//! Error types for secret resolution

use aws_credential_types::provider::error::CredentialsError;
use thiserror::Error;

/// Errors reported by a [`SecretStore`](crate::store::SecretStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Secret '{0}' not found")]
    NotFound(String),
    #[error("{0}")]
    Service(String),
}

/// Why a single secret reference could not be resolved.
#[derive(Error, Debug)]
pub enum SecretError {
    /// The store failed or does not know the identifier.
    #[error("get value from secret manager: {0}")]
    Fetch(#[from] StoreError),
    /// The secret exists but carries no string payload (e.g. binary only).
    #[error("no secret string value found")]
    MissingString,
    /// The cancellation token fired before the store answered.
    #[error("secret lookup cancelled")]
    Cancelled,
}

/// A failed resolution, tagged with the configuration key that triggered it.
///
/// The error keeps the value that was declared for the key so callers never
/// have to fall back to a blank value, but the declared value is only the
/// secret identifier and must not be used as configuration.
#[derive(Error, Debug)]
#[error("get secret for key {key}: {source}")]
pub struct ResolveError {
    key: String,
    declared_value: String,
    #[source]
    source: SecretError,
}

impl ResolveError {
    pub(crate) fn new(key: &str, declared_value: &str, source: SecretError) -> Self {
        Self {
            key: key.to_string(),
            declared_value: declared_value.to_string(),
            source,
        }
    }

    /// The configuration key whose secret reference failed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The secret identifier that was declared for the key.
    pub fn declared_value(&self) -> &str {
        &self.declared_value
    }

    pub fn kind(&self) -> &SecretError {
        &self.source
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, SecretError::Cancelled)
    }
}

/// Errors raised while building the AWS-backed resolver.
///
/// These are startup errors: a process that cannot build its resolver
/// cannot load its configuration and should exit.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load default aws config: no region configured")]
    MissingRegion,
    #[error("failed to load default aws config: no credentials provider configured")]
    MissingCredentials,
    #[error("failed to load default aws config: {0}")]
    Credentials(#[from] CredentialsError),
}

/// A type alias for `Result<T, ResolveError>`
pub type Result<T> = std::result::Result<T, ResolveError>;
