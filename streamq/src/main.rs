mod config;

use clap::Parser;
use config::{Config, ConfigError};
use dispatch::{Dispatcher, ReplayLog};
use metrics_exporter_statsd::StatsdBuilder;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "streamq", about = "Credential-gated analytics dispatch service")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long)]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum StreamqError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build HTTP clients: {0}")]
    Client(#[from] reqwest::Error),
    #[error("could not read replay log: {0}")]
    Replay(#[from] dispatch::replay::ReplayError),
    #[error("intake listener failed: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> Result<(), StreamqError> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Keep the guard alive for the lifetime of the process.
    let _sentry_guard = config.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = &config.metrics {
        install_statsd(&metrics_config.statsd_host, metrics_config.statsd_port);
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("build tokio runtime");

    rt.block_on(run(config))
}

fn install_statsd(host: &str, port: u16) {
    let recorder = match StatsdBuilder::from(host, port).build(Some("streamq")) {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build statsd exporter, metrics disabled");
            return;
        }
    };

    if let Err(e) = metrics::set_global_recorder(recorder) {
        tracing::error!(error = %e, "Failed to install metrics recorder");
    }
}

async fn run(config: Config) -> Result<(), StreamqError> {
    let dispatcher = Dispatcher::from_config(&config.dispatch)?;

    // The worker signals readiness as soon as its loop starts.
    dispatcher.wait_ready().await;

    if let Some(path) = &config.replay_path {
        flush_replay(path, &dispatcher)?;
    }

    tracing::info!(
        application_id = %dispatcher.application_id(),
        host = %config.dispatch.listener.host,
        port = config.dispatch.listener.port,
        "Starting intake service"
    );

    dispatch::api::serve(
        dispatcher,
        &config.dispatch.listener.host,
        config.dispatch.listener.port,
    )
    .await?;

    Ok(())
}

/// Flushes events buffered before this process started, in original
/// order, ahead of any live intake traffic.
fn flush_replay(path: &std::path::Path, dispatcher: &Dispatcher) -> Result<(), StreamqError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Replay log not found, skipping");
        return Ok(());
    }

    let reader = BufReader::new(File::open(path)?);
    let log = ReplayLog::from_reader(reader, None)?;
    let total = log.len();

    match log.flush_into(dispatcher) {
        Ok(flushed) => tracing::info!(flushed, total, "Replay log flushed"),
        Err(e) => tracing::error!(error = %e, "Replay flush aborted"),
    }

    Ok(())
}
