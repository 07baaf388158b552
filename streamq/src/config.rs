use dispatch::Config as DispatchConfig;
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;

#[derive(Deserialize, Debug)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
    /// JSON-lines file of events buffered before this process started;
    /// flushed once into the queue at startup, in original order.
    pub replay_path: Option<PathBuf>,
    pub dispatch: DispatchConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            replay_path: /var/lib/streamq/replay.jsonl
            dispatch:
                application_id: app-1
                credential_authority_endpoint: https://credentials.internal
                credential_ttl_seconds: 300
                listener:
                    host: 0.0.0.0
                    port: 8080
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.dispatch.application_id, "app-1");
        assert_eq!(config.dispatch.credential_ttl_seconds, 300);
        assert_eq!(config.metrics.unwrap().statsd_port, 8125);
        assert_eq!(
            config.replay_path.unwrap(),
            PathBuf::from("/var/lib/streamq/replay.jsonl")
        );
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let yaml = r#"
            dispatch:
                application_id: app-1
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.dispatch.credential_ttl_seconds, 900);
        assert_eq!(config.dispatch.listener.port, 3000);
    }
}
