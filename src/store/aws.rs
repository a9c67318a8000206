//! AWS Secrets Manager backed store

use super::{SecretRecord, SecretStore};
use crate::error::StoreError;
use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;

#[async_trait]
impl SecretStore for Client {
    async fn get_secret_value(&self, secret_id: &str) -> Result<SecretRecord, StoreError> {
        let output = self
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|err| {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception());
                if not_found {
                    StoreError::NotFound(secret_id.to_string())
                } else {
                    StoreError::Service(DisplayErrorContext(&err).to_string())
                }
            })?;

        Ok(SecretRecord {
            arn: output.arn().map(str::to_owned),
            name: output.name().map(str::to_owned),
            version_id: output.version_id().map(str::to_owned),
            secret_string: output.secret_string().map(str::to_owned),
            secret_binary: output.secret_binary().map(|blob| blob.as_ref().to_vec()),
        })
    }

    fn name(&self) -> &'static str {
        "secretsmanager"
    }
}
