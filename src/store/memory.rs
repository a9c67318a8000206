use super::{SecretRecord, SecretStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A store keeping secrets in memory.
///
/// Secrets are addressable by their name and by a synthetic ARN shaped like
/// the ones Secrets Manager hands out, so code paths that accept either can
/// be exercised without AWS.
///
/// Creating a secret under an existing name stores a new version: the ARN
/// stays the same and both name and ARN see the new payload.
///
/// Clones share the same underlying map.
///
/// # Example
///
/// ```ignore
/// use envsecret::store::InMemoryStore;
///
/// let store = InMemoryStore::new("eu-central-1");
/// let arn = store.create_secret("MySecretVar", "superSecretValue");
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    region: String,
    secrets: Arc<RwLock<Secrets>>,
}

#[derive(Debug, Default)]
struct Secrets {
    /// Records keyed by name and by ARN.
    records: HashMap<String, Arc<SecretRecord>>,
    created: u64,
    versions: u64,
}

impl InMemoryStore {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            secrets: Arc::new(RwLock::new(Secrets::default())),
        }
    }

    /// Stores a secret with a string payload and returns its ARN.
    pub fn create_secret(&self, name: &str, value: &str) -> String {
        self.insert(name, Some(value.to_string()), None)
    }

    /// Stores a secret with only a binary payload and returns its ARN.
    pub fn create_binary_secret(&self, name: &str, value: &[u8]) -> String {
        self.insert(name, None, Some(value.to_vec()))
    }

    fn insert(&self, name: &str, string: Option<String>, binary: Option<Vec<u8>>) -> String {
        let mut secrets = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        let existing = secrets.records.get(name).and_then(|record| record.arn.clone());
        let arn = match existing {
            Some(arn) => arn,
            None => {
                secrets.created += 1;
                format!(
                    "arn:aws:secretsmanager:{}:000000000000:secret:{}-{:06x}",
                    self.region, name, secrets.created
                )
            }
        };
        secrets.versions += 1;
        let record = Arc::new(SecretRecord {
            arn: Some(arn.clone()),
            name: Some(name.to_string()),
            version_id: Some(format!("v{}", secrets.versions)),
            secret_string: string,
            secret_binary: binary,
        });
        secrets.records.insert(name.to_string(), Arc::clone(&record));
        secrets.records.insert(arn.clone(), record);
        arn
    }
}

#[async_trait]
impl SecretStore for InMemoryStore {
    async fn get_secret_value(&self, secret_id: &str) -> Result<SecretRecord, StoreError> {
        let secrets = self.secrets.read().unwrap_or_else(|e| e.into_inner());
        secrets
            .records
            .get(secret_id)
            .map(|record| SecretRecord::clone(record))
            .ok_or_else(|| StoreError::NotFound(secret_id.to_string()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
