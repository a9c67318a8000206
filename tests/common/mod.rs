use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use envsecret::{SecretResolver, options};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const GET_SECRET_VALUE: &str = "secretsmanager.GetSecretValue";

/// A stand-in for Secrets Manager speaking its JSON protocol
pub struct FakeSecretsManager {
    pub server: MockServer,
}

impl FakeSecretsManager {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Serves a string secret under both its name and its ARN.
    pub async fn create_secret(&self, name: &str, value: &str) -> String {
        let arn = format!(
            "arn:aws:secretsmanager:eu-central-1:000000000000:secret:{}-AbCdEf",
            name
        );
        let body = json!({
            "ARN": arn,
            "Name": name,
            "VersionId": "EXAMPLE1-90ab-cdef-fedc-ba987SECRET1",
            "SecretString": value,
            "VersionStages": ["AWSCURRENT"],
            "CreatedDate": 1.523477145713E9
        });
        for id in [name, arn.as_str()] {
            let response = ResponseTemplate::new(200).set_body_raw(body.to_string(), AMZ_JSON);
            self.respond(id, response).await;
        }
        arn
    }

    /// Serves a secret that only has a binary payload.
    pub async fn create_binary_secret(&self, name: &str) {
        let body = json!({
            "ARN": format!("arn:aws:secretsmanager:eu-central-1:000000000000:secret:{}-XyZxYz", name),
            "Name": name,
            "SecretBinary": "AAEC",
            "VersionStages": ["AWSCURRENT"]
        });
        let response = ResponseTemplate::new(200).set_body_raw(body.to_string(), AMZ_JSON);
        self.respond(name, response).await;
    }

    /// Answers with ResourceNotFoundException for `name`.
    pub async fn missing_secret(&self, name: &str) {
        let body = json!({
            "__type": "ResourceNotFoundException",
            "Message": "Secrets Manager can't find the specified secret."
        });
        let response = ResponseTemplate::new(400)
            .insert_header("x-amzn-errortype", "ResourceNotFoundException")
            .set_body_raw(body.to_string(), AMZ_JSON);
        self.respond(name, response).await;
    }

    async fn respond(&self, secret_id: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-amz-target", GET_SECRET_VALUE))
            .and(body_partial_json(json!({ "SecretId": secret_id })))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// A resolver talking to this fake instead of AWS.
    pub async fn resolver(&self) -> SecretResolver {
        let options = vec![options::endpoint_url(self.server.uri())];
        SecretResolver::from_sdk_config(&test_sdk_config(), options)
            .await
            .unwrap()
    }
}

/// AWS configuration with static credentials, independent of the environment.
pub fn test_sdk_config() -> SdkConfig {
    SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("eu-central-1"))
        .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
            "test", "test", None, None, "test",
        )))
        .build()
}
