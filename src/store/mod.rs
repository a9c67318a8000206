//! # Secret stores
//!
//! A [`SecretStore`] fetches the content of a secret by identifier. The
//! resolver hook only ever needs that single read operation, which keeps the
//! seam narrow enough to swap AWS Secrets Manager for an in-memory store in
//! tests.
//!
//! ## Available Stores
//!
//! - `aws_sdk_secretsmanager::Client`: AWS Secrets Manager (see [`aws`])
//! - [`InMemoryStore`]: a map of secrets addressable by name or ARN

use crate::error::StoreError;
use async_trait::async_trait;

pub mod aws;
pub mod memory;

pub use memory::InMemoryStore;

/// A secret as returned by the store.
///
/// Mirrors the shape of a Secrets Manager `GetSecretValue` response. Only
/// [`secret_string`](SecretRecord::secret_string) is consumed by the
/// resolver; the binary payload is kept so the resolver can tell "binary
/// only" apart from "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretRecord {
    /// Fully qualified locator of the secret.
    pub arn: Option<String>,
    /// Friendly name of the secret.
    pub name: Option<String>,
    pub version_id: Option<String>,
    /// The string payload, if the secret has one.
    pub secret_string: Option<String>,
    /// The binary payload, if the secret has one.
    pub secret_binary: Option<Vec<u8>>,
}

/// Trait defining the read side of a secret store.
///
/// # Thread Safety
///
/// Stores must be `Send + Sync`: one handle is shared by every resolution,
/// possibly from several tasks at once. Implementations must not need
/// mutation after construction.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches the secret identified by `secret_id`.
    ///
    /// The identifier is passed through verbatim; the store decides whether
    /// it is a friendly name or a fully qualified locator.
    ///
    /// # Returns
    ///
    /// - `Ok(record)` if the secret exists, whatever payloads it has
    /// - `Err(StoreError::NotFound)` if no secret matches the identifier
    /// - `Err(StoreError::Service)` for any other failure
    async fn get_secret_value(&self, secret_id: &str) -> Result<SecretRecord, StoreError>;

    /// Returns the name of this store, used in log output.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<S: SecretStore + ?Sized> SecretStore for std::sync::Arc<S> {
    async fn get_secret_value(&self, secret_id: &str) -> Result<SecretRecord, StoreError> {
        (**self).get_secret_value(secret_id).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
