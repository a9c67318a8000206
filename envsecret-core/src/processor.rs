//! The configuration walker

use crate::de;
use crate::error::{ProcessError, Result};
use crate::lookup::{Lookuper, OsLookuper};
use crate::mutator::{Entry, Mutation, Mutator};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Populates configuration types from a [`Lookuper`] through a mutator chain.
///
/// Keys are processed sequentially in declaration order. The first mutator
/// error aborts the pass: no configuration value is produced and the error is
/// returned unchanged.
///
/// # Example
///
/// ```ignore
/// let config: Config = Processor::new()
///     .mutator(resolver)
///     .process(&CancellationToken::new())
///     .await?;
/// ```
pub struct Processor<L = OsLookuper> {
    lookuper: L,
    mutators: Vec<Arc<dyn Mutator>>,
}

impl Processor<OsLookuper> {
    /// Creates a processor reading from the process environment.
    pub fn new() -> Self {
        Self::with_lookuper(OsLookuper)
    }
}

impl Default for Processor<OsLookuper> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lookuper> Processor<L> {
    /// Creates a processor reading from `lookuper`, with an empty chain.
    pub fn with_lookuper(lookuper: L) -> Self {
        Self {
            lookuper,
            mutators: Vec::new(),
        }
    }

    /// Appends a mutator to the end of the chain.
    pub fn mutator(mut self, mutator: impl Mutator + 'static) -> Self {
        self.mutators.push(Arc::new(mutator));
        self
    }

    /// Appends an already shared mutator to the end of the chain.
    pub fn shared_mutator(mut self, mutator: Arc<dyn Mutator>) -> Self {
        self.mutators.push(mutator);
        self
    }

    pub fn lookuper(&self) -> &L {
        &self.lookuper
    }

    /// Populates `T` from the lookuper.
    ///
    /// Every field of `T` (after serde renames) is read from the upper-cased
    /// field name, so `database_url` comes from `DATABASE_URL`. Each present
    /// key runs through the mutator chain before the struct is deserialized,
    /// so absent keys behave like absent map entries: `Option` fields become
    /// `None`, `#[serde(default)]` fields take their default and any other
    /// field fails with a "missing value" error.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::NotAStruct`] if `T` is not a struct with named fields
    /// - [`ProcessError::Mutate`] with the first mutator failure
    /// - [`ProcessError::Deserialize`] if a value does not fit its field
    pub async fn process<T: DeserializeOwned>(&self, ctx: &CancellationToken) -> Result<T> {
        let fields = de::struct_fields::<T>().map_err(ProcessError::NotAStruct)?;
        let keys: Vec<String> = fields.iter().map(|field| de::env_key(field)).collect();

        let mut values = BTreeMap::new();
        let mut mutated = BTreeSet::new();
        for key in &keys {
            let Some((original_value, value)) = self.resolve_key(ctx, key).await? else {
                continue;
            };
            if value != original_value {
                mutated.insert(value.clone());
            }
            values.insert(key.clone(), value);
        }
        de::from_values(values, &mutated)
    }

    /// Looks up and mutates each of `keys`, in order.
    ///
    /// Keys the lookuper does not know are left out of the returned map. The
    /// map is keyed by the declared key, not the looked up one.
    pub async fn resolve_keys<'k, I>(
        &self,
        ctx: &CancellationToken,
        keys: I,
    ) -> Result<BTreeMap<String, String>>
    where
        I: IntoIterator<Item = &'k str>,
    {
        let mut resolved = BTreeMap::new();
        for key in keys {
            if let Some((_, value)) = self.resolve_key(ctx, key).await? {
                resolved.insert(key.to_string(), value);
            }
        }
        Ok(resolved)
    }

    /// Returns the looked up value of `key` and its mutated form.
    async fn resolve_key(
        &self,
        ctx: &CancellationToken,
        key: &str,
    ) -> Result<Option<(String, String)>> {
        let Some(original_value) = self.lookuper.lookup(key) else {
            tracing::trace!(key, "key not set, skipping");
            return Ok(None);
        };
        let resolved_key = self.lookuper.resolve_key(key);
        let value = self
            .mutate(ctx, key, &resolved_key, &original_value)
            .await?;
        Ok(Some((original_value, value)))
    }

    async fn mutate(
        &self,
        ctx: &CancellationToken,
        original_key: &str,
        key: &str,
        original_value: &str,
    ) -> Result<String> {
        let mut current = original_value.to_string();
        for mutator in &self.mutators {
            let entry = Entry {
                original_key,
                key,
                original_value,
                value: &current,
            };
            let mutation = mutator
                .mutate(ctx, &entry)
                .await
                .map_err(ProcessError::Mutate)?;
            let stop = mutation.is_stop();
            current = mutation.into_value();
            if stop {
                tracing::trace!(key, "mutator chain stopped");
                break;
            }
        }
        Ok(current)
    }
}

/// Populates `T` from the process environment with a single mutator.
///
/// Shorthand for `Processor::new().mutator(mutator).process(ctx)`.
pub async fn process<T, M>(ctx: &CancellationToken, mutator: M) -> Result<T>
where
    T: DeserializeOwned,
    M: Mutator + 'static,
{
    Processor::new().mutator(mutator).process(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, MapLookuper, MutatorFunc, PrefixLookuper};
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Config {
        my_var: String,
        #[serde(default)]
        port: Option<u16>,
    }

    fn upper() -> MutatorFunc<impl Fn(&Entry<'_>) -> std::result::Result<Mutation, BoxError>> {
        MutatorFunc::new(|entry: &Entry<'_>| Ok(Mutation::Continue(entry.value.to_uppercase())))
    }

    fn failing(key: &'static str) -> MutatorFunc<impl Fn(&Entry<'_>) -> std::result::Result<Mutation, BoxError>> {
        MutatorFunc::new(move |entry: &Entry<'_>| {
            if entry.key == key {
                Err(format!("boom for {}", entry.key).into())
            } else {
                Ok(Mutation::Continue(entry.value.to_string()))
            }
        })
    }

    /// Records the order and content of every entry it sees.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, String, String, String)>>,
    }

    #[async_trait::async_trait]
    impl Mutator for Recorder {
        async fn mutate(
            &self,
            _ctx: &CancellationToken,
            entry: &Entry<'_>,
        ) -> std::result::Result<Mutation, BoxError> {
            self.seen.lock().unwrap().push((
                entry.original_key.to_string(),
                entry.key.to_string(),
                entry.original_value.to_string(),
                entry.value.to_string(),
            ));
            Ok(Mutation::Continue(entry.value.to_string()))
        }
    }

    #[tokio::test]
    async fn test_process_without_mutators() {
        let lookuper = MapLookuper::from([("MY_VAR", "my-value"), ("PORT", "8080")]);
        let config: Config = Processor::with_lookuper(lookuper)
            .process(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            config,
            Config {
                my_var: "my-value".to_string(),
                port: Some(8080),
            }
        );
    }

    #[tokio::test]
    async fn test_process_missing_optional_field() {
        let lookuper = MapLookuper::from([("MY_VAR", "my-value")]);
        let config: Config = Processor::with_lookuper(lookuper)
            .process(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(config.port, None);
    }

    #[tokio::test]
    async fn test_process_missing_required_field() {
        let result = Processor::with_lookuper(MapLookuper::new())
            .process::<Config>(&CancellationToken::new())
            .await;
        match result {
            Err(ProcessError::Deserialize(message)) => {
                assert!(message.contains("my_var"), "{}", message)
            }
            other => panic!("Expected missing field error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_process_rejects_non_struct() {
        let result = Processor::with_lookuper(MapLookuper::new())
            .process::<Vec<String>>(&CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ProcessError::NotAStruct(_))));
    }

    #[tokio::test]
    async fn test_mutators_run_in_order() {
        let recorder = Arc::new(Recorder::default());
        let lookuper = MapLookuper::from([("MY_VAR", "abc")]);
        let config: Config = Processor::with_lookuper(lookuper)
            .mutator(upper())
            .shared_mutator(recorder.clone())
            .process(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(config.my_var, "ABC");
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(
                "MY_VAR".to_string(),
                "MY_VAR".to_string(),
                "abc".to_string(),
                "ABC".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_stop_skips_remaining_mutators() {
        let stop = MutatorFunc::new(|entry: &Entry<'_>| {
            Ok(Mutation::Stop(format!("{}!", entry.value)))
        });
        let lookuper = MapLookuper::from([("MY_VAR", "abc")]);
        let config: Config = Processor::with_lookuper(lookuper)
            .mutator(stop)
            .mutator(upper())
            .process(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(config.my_var, "abc!");
    }

    #[tokio::test]
    async fn test_first_error_aborts_pass() {
        let recorder = Arc::new(Recorder::default());
        let lookuper = MapLookuper::from([("MY_VAR", "abc"), ("PORT", "1")]);
        let result = Processor::with_lookuper(lookuper)
            .mutator(failing("MY_VAR"))
            .shared_mutator(recorder.clone())
            .process::<Config>(&CancellationToken::new())
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ProcessError::Mutate(_)));
        assert_eq!(err.to_string(), "boom for MY_VAR");
        // MY_VAR is declared first, so PORT is never reached.
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutated_values_are_masked_in_errors() {
        let swap = MutatorFunc::new(|entry: &Entry<'_>| {
            let value = if entry.key == "PORT" { "s3cr3t" } else { entry.value };
            Ok(Mutation::Continue(value.to_string()))
        });
        let lookuper = MapLookuper::from([("MY_VAR", "abc"), ("PORT", "reference")]);
        let err = Processor::with_lookuper(lookuper)
            .mutator(swap)
            .process::<Config>(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::Deserialize(_)));
        assert!(!err.to_string().contains("s3cr3t"), "{}", err);
    }

    #[tokio::test]
    async fn test_prefix_lookuper_reports_resolved_key() {
        let recorder = Arc::new(Recorder::default());
        let lookuper = PrefixLookuper::new(
            "APP_",
            MapLookuper::from([("APP_MY_VAR", "v"), ("MY_VAR", "wrong")]),
        );
        let config: Config = Processor::with_lookuper(lookuper)
            .shared_mutator(recorder.clone())
            .process(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(config.my_var, "v");
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].0, "MY_VAR");
        assert_eq!(seen[0].1, "APP_MY_VAR");
    }

    #[tokio::test]
    async fn test_resolve_keys_skips_unset_keys() {
        let lookuper = MapLookuper::from([("A", "a"), ("C", "c")]);
        let values = Processor::with_lookuper(lookuper)
            .mutator(upper())
            .resolve_keys(&CancellationToken::new(), ["A", "B", "C"])
            .await
            .unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values["A"], "A");
        assert_eq!(values["C"], "C");
    }
}
