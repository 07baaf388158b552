use serde::Deserialize;
use std::time::Duration;

fn default_authority_endpoint() -> String {
    "https://credentials.streamq.dev".into()
}

fn default_ttl_seconds() -> u64 {
    900
}

fn default_timeout_seconds() -> u64 {
    10
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    /// Partition key for submissions and scope for credential fetches.
    pub application_id: String,
    #[serde(default = "default_authority_endpoint")]
    pub credential_authority_endpoint: String,
    /// The authority does not return an expiry, so validity is computed
    /// locally as fetch time plus this TTL.
    #[serde(default = "default_ttl_seconds")]
    pub credential_ttl_seconds: u64,
    /// Applies to each refresh and each submission round trip.
    #[serde(default = "default_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Overrides the region-derived ingest endpoint.
    pub destination_endpoint: Option<String>,
    #[serde(default)]
    pub listener: Listener,
}

impl Config {
    pub fn credential_ttl(&self) -> Duration {
        Duration::from_secs(self.credential_ttl_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
