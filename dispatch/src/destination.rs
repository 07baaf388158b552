use crate::authority::StreamGrant;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error("destination request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("destination returned status {0}")]
    BadStatus(reqwest::StatusCode),
}

/// Streaming-ingest capability: put one payload onto a stream under a
/// partition key.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    async fn put(
        &self,
        stream_name: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<(), SubmitError>;
}

/// A destination client bound to one stream. Always created together
/// with the credential it was built from and replaced with it as a pair.
pub struct DestinationHandle {
    stream_name: String,
    client: Arc<dyn DestinationClient>,
}

impl std::fmt::Debug for DestinationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationHandle")
            .field("stream_name", &self.stream_name)
            .finish_non_exhaustive()
    }
}

impl DestinationHandle {
    pub fn new(stream_name: &str, client: Arc<dyn DestinationClient>) -> Self {
        DestinationHandle {
            stream_name: stream_name.to_string(),
            client,
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub async fn submit(&self, partition_key: &str, payload: &[u8]) -> Result<(), SubmitError> {
        self.client.put(&self.stream_name, partition_key, payload).await
    }
}

/// Builds a DestinationHandle from freshly fetched credential material.
pub trait DestinationBinder: Send + Sync {
    fn bind(&self, grant: &StreamGrant) -> Arc<DestinationHandle>;
}

/// Binder for the HTTP ingest endpoint. The endpoint is derived from
/// the grant's region unless an override is configured.
pub struct HttpBinder {
    endpoint_override: Option<String>,
    timeout: Duration,
}

impl HttpBinder {
    pub fn new(endpoint_override: Option<String>, timeout: Duration) -> Self {
        HttpBinder {
            endpoint_override,
            timeout,
        }
    }
}

impl DestinationBinder for HttpBinder {
    fn bind(&self, grant: &StreamGrant) -> Arc<DestinationHandle> {
        let endpoint = match &self.endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://kinesis.{}.amazonaws.com", grant.region),
        };

        let client = HttpDestination::new(&endpoint, &grant.token, self.timeout);
        Arc::new(DestinationHandle::new(&grant.stream_name, Arc::new(client)))
    }
}

/// Kinesis-flavored PutRecord over plain HTTP. The grant token is
/// pre-scoped by the authority, so no request signing happens here.
pub struct HttpDestination {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    timeout: Duration,
}

impl HttpDestination {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Self {
        HttpDestination {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl DestinationClient for HttpDestination {
    async fn put(
        &self,
        stream_name: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<(), SubmitError> {
        let body = json!({
            "StreamName": stream_name,
            "PartitionKey": partition_key,
            "Data": STANDARD.encode(payload),
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", "Kinesis_20131202.PutRecord")
            .header("X-Amz-Security-Token", &self.token)
            .header("Content-Type", "application/x-amz-json-1.1")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SubmitError::BadStatus(response.status()));
        }

        Ok(())
    }
}
