use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Credential material and destination configuration returned by the
/// authority for one application id.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StreamGrant {
    pub region: String,
    #[serde(rename = "roleArn")]
    pub role_arn: String,
    #[serde(rename = "streamName")]
    pub stream_name: String,
    pub token: String,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthorityError {
    #[error("credential authority request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("credential authority returned status {0}")]
    BadStatus(reqwest::StatusCode),
}

/// Fetches fresh credential material for an application. Callers decide
/// retry policy; a fetch is attempted exactly once per call.
#[async_trait]
pub trait CredentialAuthority: Send + Sync {
    async fn fetch(&self, app_id: &str) -> Result<StreamGrant, AuthorityError>;
}

pub struct HttpAuthority {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuthority {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(HttpAuthority {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CredentialAuthority for HttpAuthority {
    async fn fetch(&self, app_id: &str) -> Result<StreamGrant, AuthorityError> {
        let url = format!("{}/v1/streams/{}/credentials", self.endpoint, app_id);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AuthorityError::BadStatus(response.status()));
        }

        Ok(response.json::<StreamGrant>().await?)
    }
}
