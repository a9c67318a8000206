//! Error types for configuration processing

use thiserror::Error;

/// Boxed error returned by [`Mutator`](crate::Mutator) implementations.
///
/// Mutators come from different crates with their own error types, so the
/// chain carries them type-erased and the processor surfaces them unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while processing a configuration type.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// A mutator in the chain failed for one of the keys.
    #[error(transparent)]
    Mutate(BoxError),
    /// The target type does not deserialize as a struct with named fields.
    #[error("configuration type must be a struct with named fields, got {0}")]
    NotAStruct(&'static str),
    /// The resolved values could not be assigned to the target type.
    ///
    /// Values produced by mutators are masked in the message.
    #[error("failed to populate configuration: {0}")]
    Deserialize(String),
    #[error("Dotenv error: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

/// A type alias for `Result<T, ProcessError>`
pub type Result<T> = std::result::Result<T, ProcessError>;
