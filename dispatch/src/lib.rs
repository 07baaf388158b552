pub mod api;
pub mod authority;
pub mod config;
pub mod credential;
pub mod destination;
pub mod errors;
pub mod metrics_defs;
pub mod provider;
pub mod queue;
pub mod record;
pub mod replay;
pub mod worker;

#[cfg(test)]
pub mod testutils;

pub use config::Config;
pub use errors::DispatchError;
pub use queue::EnqueueError;
pub use record::{Identity, NormalizedRecord, RawEvent};
pub use replay::ReplayLog;

use authority::{CredentialAuthority, HttpAuthority};
use destination::{DestinationBinder, HttpBinder};
use provider::CredentialProvider;
use queue::{QueueSender, dispatch_queue};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use worker::DispatchWorker;

struct DispatcherInner {
    // Taken on shutdown; dropping the last sender lets the worker
    // drain the backlog and exit.
    tx: Mutex<Option<QueueSender>>,
    ready: watch::Receiver<bool>,
    application_id: String,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

/// Handle to the dispatch pipeline. Cloning shares the same queue and
/// the single worker task behind it. Must be created inside a tokio
/// runtime.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn new(
        config: &Config,
        authority: Arc<dyn CredentialAuthority>,
        binder: Arc<dyn DestinationBinder>,
    ) -> Self {
        let (tx, rx) = dispatch_queue();
        let (ready_tx, ready_rx) = watch::channel(false);

        let provider = CredentialProvider::new(
            authority,
            binder,
            &config.application_id,
            config.credential_ttl(),
        );
        let worker = DispatchWorker::new(rx, provider, &config.application_id, ready_tx);
        let handle = tokio::spawn(worker.run());

        Dispatcher {
            inner: Arc::new(DispatcherInner {
                tx: Mutex::new(Some(tx)),
                ready: ready_rx,
                application_id: config.application_id.clone(),
                handle,
            }),
        }
    }

    /// Wires up the HTTP authority and destination from config.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let authority = HttpAuthority::new(
            &config.credential_authority_endpoint,
            config.request_timeout(),
        )?;
        let binder = HttpBinder::new(config.destination_endpoint.clone(), config.request_timeout());

        Ok(Dispatcher::new(config, Arc::new(authority), Arc::new(binder)))
    }

    /// The only producer entry point. Non-blocking; callable from any
    /// number of concurrent tasks.
    pub fn enqueue(&self, record: NormalizedRecord) -> Result<(), EnqueueError> {
        match self.inner.tx.lock().unwrap().as_ref() {
            Some(tx) => tx.push(record),
            None => Err(EnqueueError::Closed),
        }
    }

    /// Normalizes a raw event (assigning messageId and sentAt) and
    /// enqueues it, returning the assigned message id.
    pub fn enqueue_event(
        &self,
        event: RawEvent,
        identity: Identity,
    ) -> Result<String, EnqueueError> {
        let record = NormalizedRecord::normalize(event, identity, &self.inner.application_id);
        let message_id = record.message_id.clone();
        self.enqueue(record)?;
        Ok(message_id)
    }

    /// True once the worker loop has started. Consumed by the /ready
    /// probe.
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    /// Suspends until the worker loop has started. Consumed by the
    /// replay flush. Returns immediately if the worker already exited.
    pub async fn wait_ready(&self) {
        let mut ready = self.inner.ready.clone();
        let _ = ready.wait_for(|started| *started).await;
    }

    pub fn application_id(&self) -> &str {
        &self.inner.application_id
    }

    /// Closes the queue. The worker drains whatever is already pushed
    /// and exits; later enqueues fail with Closed.
    pub fn shutdown(&self) {
        self.inner.tx.lock().unwrap().take();
    }
}
