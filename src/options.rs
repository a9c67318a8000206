//! Overrides applied to the Secrets Manager client configuration.
//!
//! Options are applied in order after the default AWS configuration has been
//! loaded, so an option always wins over the environment. Anything not
//! covered by a dedicated variant can be set with [`ClientOption::custom`]:
//!
//! ```ignore
//! use aws_sdk_secretsmanager::config::retry::RetryConfig;
//! use envsecret::options::ClientOption;
//!
//! let no_retries = ClientOption::custom(|builder| {
//!     builder.set_retry_config(Some(RetryConfig::disabled()));
//! });
//! ```

use aws_config::Region;
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_sdk_secretsmanager::config::Builder;
use std::fmt;

/// A single override of the Secrets Manager client configuration.
pub enum ClientOption {
    /// Use this region instead of the one found in the environment.
    Region(Region),
    /// Send requests to this URL instead of the regional AWS endpoint.
    EndpointUrl(String),
    /// Use this credentials provider instead of the default chain.
    Credentials(SharedCredentialsProvider),
    /// Arbitrary change to the client configuration builder.
    Custom(Box<dyn FnOnce(&mut Builder) + Send>),
}

impl ClientOption {
    pub fn custom(f: impl FnOnce(&mut Builder) + Send + 'static) -> Self {
        ClientOption::Custom(Box::new(f))
    }

    pub(crate) fn apply(self, builder: &mut Builder) {
        match self {
            ClientOption::Region(region) => {
                builder.set_region(Some(region));
            }
            ClientOption::EndpointUrl(url) => {
                builder.set_endpoint_url(Some(url));
            }
            ClientOption::Credentials(provider) => {
                builder.set_credentials_provider(Some(provider));
            }
            ClientOption::Custom(f) => f(builder),
        }
    }
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientOption::Region(region) => f.debug_tuple("Region").field(region).finish(),
            ClientOption::EndpointUrl(url) => f.debug_tuple("EndpointUrl").field(url).finish(),
            ClientOption::Credentials(_) => f.write_str("Credentials(..)"),
            ClientOption::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Uses `region` instead of the one found in the environment.
pub fn region(region: impl Into<String>) -> ClientOption {
    ClientOption::Region(Region::new(region.into()))
}

/// Sends requests to `url` instead of the regional AWS endpoint.
///
/// Used to target a local Secrets Manager emulator.
pub fn endpoint_url(url: impl Into<String>) -> ClientOption {
    ClientOption::EndpointUrl(url.into())
}

/// Uses static credentials instead of the default credential chain.
pub fn credentials(
    access_key_id: impl Into<String>,
    secret_access_key: impl Into<String>,
) -> ClientOption {
    let credentials = Credentials::new(
        access_key_id.into(),
        secret_access_key.into(),
        None,
        None,
        "envsecret-static",
    );
    ClientOption::Credentials(SharedCredentialsProvider::new(credentials))
}
