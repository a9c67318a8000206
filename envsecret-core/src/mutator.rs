//! Value mutators applied between lookup and assignment

use crate::BoxError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A configuration value on its way through the mutator chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    /// The key as declared on the configuration type.
    pub original_key: &'a str,
    /// The key actually looked up (after any lookuper rewriting).
    pub key: &'a str,
    /// The value as read by the lookuper.
    pub original_value: &'a str,
    /// The value after every earlier mutator in the chain ran.
    pub value: &'a str,
}

/// Result of a single mutator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Use this value and hand it to the next mutator.
    Continue(String),
    /// Use this value and skip the remaining mutators for this key.
    Stop(String),
}

impl Mutation {
    /// The value carried by the mutation.
    pub fn value(&self) -> &str {
        match self {
            Mutation::Continue(value) | Mutation::Stop(value) => value,
        }
    }

    pub fn into_value(self) -> String {
        match self {
            Mutation::Continue(value) | Mutation::Stop(value) => value,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Mutation::Stop(_))
    }
}

/// Trait defining one step of the mutator chain.
///
/// Mutators are invoked once per present key, in the order they were
/// registered on the [`Processor`](crate::Processor). They must be
/// `Send + Sync`: a single instance is shared by every processing pass.
///
/// # Cancellation
///
/// Long running mutators should watch `ctx` and give up promptly once it is
/// cancelled.
#[async_trait]
pub trait Mutator: Send + Sync {
    /// Transforms the value of `entry`.
    ///
    /// # Returns
    ///
    /// - `Ok(Mutation::Continue(value))` to pass `value` on to the next mutator
    /// - `Ok(Mutation::Stop(value))` to assign `value` without running the rest of the chain
    /// - `Err` to abort the whole processing pass
    async fn mutate(
        &self,
        ctx: &CancellationToken,
        entry: &Entry<'_>,
    ) -> Result<Mutation, BoxError>;
}

/// Adapts a synchronous closure into a [`Mutator`].
///
/// # Example
///
/// ```ignore
/// use envsecret_core::{Mutation, MutatorFunc};
///
/// let trim = MutatorFunc::new(|entry| Ok(Mutation::Continue(entry.value.trim().to_string())));
/// ```
pub struct MutatorFunc<F> {
    func: F,
}

impl<F> MutatorFunc<F>
where
    F: Fn(&Entry<'_>) -> Result<Mutation, BoxError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Mutator for MutatorFunc<F>
where
    F: Fn(&Entry<'_>) -> Result<Mutation, BoxError> + Send + Sync,
{
    async fn mutate(
        &self,
        _ctx: &CancellationToken,
        entry: &Entry<'_>,
    ) -> Result<Mutation, BoxError> {
        (self.func)(entry)
    }
}
