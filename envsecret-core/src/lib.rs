//! # envsecret core
//!
//! Environment-driven configuration loading with a pluggable chain of value
//! mutators.
//!
//! A configuration type is any flat struct implementing
//! [`serde::Deserialize`] with lower-case field names. Each field is read
//! from its upper-cased name (`database_url` from `DATABASE_URL`), the
//! convention of [`envy`]. For each key the [`Processor`] reads the value
//! through a [`Lookuper`], runs it through every registered [`Mutator`] in
//! order and finally hands the resulting values to `envy`, which coerces the
//! strings into the declared field types.
//!
//! ```ignore
//! use envsecret_core::{Processor, MapLookuper};
//! use serde::Deserialize;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Deserialize)]
//! struct Config {
//!     port: u16,
//!     database_url: String,
//! }
//!
//! let lookuper = MapLookuper::from([("PORT", "8080"), ("DATABASE_URL", "postgres://db")]);
//! let config: Config = Processor::with_lookuper(lookuper)
//!     .process(&CancellationToken::new())
//!     .await?;
//! ```

mod de;
mod error;
mod lookup;
mod mutator;
mod processor;

pub use error::{BoxError, ProcessError, Result};
pub use lookup::{Lookuper, MapLookuper, OsLookuper, PrefixLookuper};
pub use mutator::{Entry, Mutation, Mutator, MutatorFunc};
pub use processor::{Processor, process};

// Re-exported so callers do not need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
