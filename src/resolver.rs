//! The secret resolver hook

use crate::error::{ConfigError, ResolveError, Result, SecretError};
use crate::options::ClientOption;
use crate::store::SecretStore;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_secretsmanager::Client;
use envsecret_core::{BoxError, Entry, Mutation, Mutator};
use tokio_util::sync::CancellationToken;

/// Marker prefix of keys whose value is a secret identifier.
///
/// There is no escape mechanism: a key starting with this prefix is always
/// resolved through the store, even if it was meant to hold a literal value.
pub const SECRET_PREFIX: &str = "SECRET_";

/// Returns whether `key` holds a secret reference rather than a value.
pub fn is_secret_reference(key: &str) -> bool {
    key.starts_with(SECRET_PREFIX)
}

/// Replaces secret references with the secret content fetched from a store.
///
/// For every key starting with [`SECRET_PREFIX`], the declared value is taken
/// as a secret identifier (name or ARN) and swapped for the secret's string
/// payload. Every other key passes through untouched, without any call to
/// the store.
///
/// The resolver holds nothing but the store handle. It never caches, never
/// retries on its own and can be shared freely between tasks.
///
/// # Example
///
/// ```ignore
/// use envsecret::SecretResolver;
/// use envsecret_core::{CancellationToken, Processor};
///
/// let resolver = SecretResolver::new(Vec::new()).await?;
/// let config: Config = Processor::new()
///     .mutator(resolver)
///     .process(&CancellationToken::new())
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct SecretResolver<S = Client> {
    store: S,
}

impl SecretResolver<Client> {
    /// Builds a resolver backed by AWS Secrets Manager.
    ///
    /// Loads the default AWS configuration (environment, shared profile
    /// files, container and instance metadata) and applies `options` on top.
    ///
    /// # Errors
    ///
    /// Fails if no region is configured or no credentials can be obtained
    /// from the resulting chain. Both are startup errors and should abort
    /// the process.
    pub async fn new(options: Vec<ClientOption>) -> std::result::Result<Self, ConfigError> {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::from_sdk_config(&sdk_config, options).await
    }

    /// Builds a resolver from an already loaded AWS configuration.
    ///
    /// Same as [`new`](SecretResolver::new) without touching the environment.
    /// A configuration without a behavior version gets the latest one.
    ///
    /// The region is checked on the final client configuration, so it may
    /// come from any option, [`ClientOption::custom`] included. Credentials
    /// are checked on the provider of `sdk_config` or the last
    /// [`ClientOption::Credentials`]. When neither exists but a custom option
    /// was applied, the check is left to the first request, since the
    /// client configuration does not expose the provider a closure installed.
    pub async fn from_sdk_config(
        sdk_config: &SdkConfig,
        options: Vec<ClientOption>,
    ) -> std::result::Result<Self, ConfigError> {
        let mut credentials = sdk_config.credentials_provider();
        let mut customized = false;

        let mut builder = aws_sdk_secretsmanager::config::Builder::from(sdk_config);
        if sdk_config.behavior_version().is_none() {
            builder.set_behavior_version(Some(BehaviorVersion::latest()));
        }
        for option in options {
            match &option {
                ClientOption::Credentials(c) => credentials = Some(c.clone()),
                ClientOption::Custom(_) => customized = true,
                _ => {}
            }
            option.apply(&mut builder);
        }
        let config = builder.build();

        let region = config.region().cloned().ok_or(ConfigError::MissingRegion)?;
        match credentials {
            Some(credentials) => {
                credentials.provide_credentials().await?;
            }
            None if customized => {
                tracing::debug!("no credentials provider known, relying on custom client options");
            }
            None => return Err(ConfigError::MissingCredentials),
        }

        tracing::debug!(%region, "secrets manager client configured");
        Ok(Self::with_store(Client::from_conf(config)))
    }
}

impl<S: SecretStore> SecretResolver<S> {
    /// Builds a resolver on top of any store.
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves the value declared for `key`.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Cancels the in-flight fetch when triggered
    /// * `key` - The environment variable name
    /// * `declared_value` - The value read for `key`, a secret identifier if `key` is marked
    ///
    /// # Returns
    ///
    /// - `Ok(declared_value)` unchanged if `key` is not a secret reference
    /// - `Ok(secret)` with the string payload of the referenced secret
    /// - `Err` naming `key` if the fetch failed, was cancelled or the
    ///   secret has no string payload
    #[tracing::instrument(level = "debug", skip(self, ctx, declared_value), fields(store = self.store.name()))]
    pub async fn resolve(
        &self,
        ctx: &CancellationToken,
        key: &str,
        declared_value: &str,
    ) -> Result<String> {
        if !is_secret_reference(key) {
            return Ok(declared_value.to_string());
        }

        self.fetch(ctx, declared_value)
            .await
            .map_err(|source| ResolveError::new(key, declared_value, source))
    }

    async fn fetch(
        &self,
        ctx: &CancellationToken,
        secret_id: &str,
    ) -> std::result::Result<String, SecretError> {
        let record = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(SecretError::Cancelled),
            record = self.store.get_secret_value(secret_id) => record?,
        };

        match record.secret_string {
            Some(secret) => {
                tracing::debug!("secret reference resolved");
                Ok(secret)
            }
            None => Err(SecretError::MissingString),
        }
    }
}

#[async_trait]
impl<S: SecretStore> Mutator for SecretResolver<S> {
    async fn mutate(
        &self,
        ctx: &CancellationToken,
        entry: &Entry<'_>,
    ) -> std::result::Result<Mutation, BoxError> {
        let value = self.resolve(ctx, entry.key, entry.value).await?;
        Ok(Mutation::Continue(value))
    }
}
