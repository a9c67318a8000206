//! Sources of raw configuration values

use crate::Result;
use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Trait defining where configuration values are read from.
///
/// The processor asks a lookuper for every declared key. Implementations may
/// rewrite the key before looking it up (see [`PrefixLookuper`]); the
/// rewritten name is reported through [`resolve_key`](Lookuper::resolve_key)
/// and handed to mutators as the entry's key.
pub trait Lookuper: Send + Sync {
    /// Returns the value stored under `key`, or `None` if it is not set.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Returns the name actually looked up for the declared `key`.
    fn resolve_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(key)
    }
}

impl<L: Lookuper + ?Sized> Lookuper for &L {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }

    fn resolve_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        (**self).resolve_key(key)
    }
}

/// Reads values from the process environment.
///
/// Variables whose value is not valid unicode are treated as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsLookuper;

impl Lookuper for OsLookuper {
    fn lookup(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// Reads values from an in-memory map.
///
/// Useful for tests, for snapshots of the environment and for `.env` files.
///
/// # Example
///
/// ```ignore
/// use envsecret_core::{Lookuper, MapLookuper};
///
/// let lookuper = MapLookuper::from([("MY_VAR", "my-value")]);
/// assert_eq!(lookuper.lookup("MY_VAR").as_deref(), Some("my-value"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapLookuper {
    values: HashMap<String, String>,
}

impl MapLookuper {
    /// Creates an empty lookuper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped, the
    /// same way [`OsLookuper`] treats them as unset.
    pub fn from_env() -> Self {
        env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Loads the entries of a `.env` file.
    ///
    /// Variable substitution follows `dotenvy`, which expands references
    /// against entries earlier in the file and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::DotEnv`](crate::ProcessError::DotEnv) if the
    /// file cannot be read or contains an invalid line.
    pub fn from_dotenv(path: impl AsRef<Path>) -> Result<Self> {
        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(path.as_ref())? {
            let (key, value) = item?;
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overlays the entries of `other` on top of this map.
    pub fn overlay(mut self, other: MapLookuper) -> Self {
        self.values.extend(other.values);
        self
    }

    /// Iterates over every stored key.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates over every stored entry.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Lookuper for MapLookuper {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapLookuper {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for MapLookuper {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Looks up every key with a fixed prefix prepended.
///
/// With prefix `APP_`, the declared key `PORT` is read from `APP_PORT` and
/// mutators see `APP_PORT` as the entry's key.
#[derive(Debug, Clone)]
pub struct PrefixLookuper<L> {
    prefix: String,
    inner: L,
}

impl<L: Lookuper> PrefixLookuper<L> {
    pub fn new(prefix: impl Into<String>, inner: L) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl<L: Lookuper> Lookuper for PrefixLookuper<L> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.inner.lookup(&self.prefixed(key))
    }

    fn resolve_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        let prefixed = self.prefixed(key);
        Cow::Owned(self.inner.resolve_key(&prefixed).into_owned())
    }
}
