//! envsecret - resolve secret references while loading configuration
//!
//! Configuration is read from environment variables. Any variable whose name
//! starts with `SECRET_` does not hold its value directly: it holds the name
//! or ARN of a secret in AWS Secrets Manager. The [`SecretResolver`] is a
//! [`Mutator`](envsecret_core::Mutator) that swaps such references for the
//! secret content before the configuration struct is populated.
//!
//! # Example
//!
//! ```ignore
//! use envsecret::SecretResolver;
//! use envsecret_core::{CancellationToken, Processor};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Config {
//!     database_host: String,
//!     // SECRET_DATABASE_PASSWORD=prod/db/password
//!     #[serde(rename = "secret_database_password")]
//!     database_password: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = SecretResolver::new(Vec::new()).await?;
//!     let config: Config = Processor::new()
//!         .mutator(resolver)
//!         .process(&CancellationToken::new())
//!         .await?;
//!     Ok(())
//! }
//! ```

mod error;
mod resolver;

pub mod options;
pub mod store;

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

pub use error::{ConfigError, ResolveError, Result, SecretError, StoreError};
pub use options::ClientOption;
pub use resolver::{SECRET_PREFIX, SecretResolver, is_secret_reference};
