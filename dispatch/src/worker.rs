use crate::credential::CredentialCache;
use crate::metrics_defs::{RECORDS_DROPPED, RECORDS_SUBMITTED, SUBMIT_DURATION};
use crate::provider::CredentialProvider;
use crate::queue::QueueReceiver;
use crate::record::NormalizedRecord;
use std::time::Instant;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Idle,
    ResolvingCredential,
    Submitting,
}

/// The single-concurrency execution unit of the pipeline. Pulls one
/// record at a time off the queue, resolves a valid credential pair,
/// submits, and only then pulls the next record. At most one refresh
/// or submit is ever in flight: the destination authority must never
/// see overlapping refresh requests, and this loop is what enforces it.
pub struct DispatchWorker {
    rx: QueueReceiver,
    provider: CredentialProvider,
    cache: CredentialCache,
    application_id: String,
    ready: watch::Sender<bool>,
    state: WorkerState,
}

impl DispatchWorker {
    pub fn new(
        rx: QueueReceiver,
        provider: CredentialProvider,
        application_id: &str,
        ready: watch::Sender<bool>,
    ) -> Self {
        DispatchWorker {
            rx,
            provider,
            cache: CredentialCache::new(),
            application_id: application_id.to_string(),
            ready,
            state: WorkerState::Idle,
        }
    }

    /// Runs until every sender is dropped and the backlog is drained.
    pub async fn run(mut self) {
        self.ready.send_replace(true);
        tracing::debug!("Dispatch worker started");

        while let Some(record) = self.rx.pop().await {
            self.process(record).await;
        }

        tracing::debug!("Dispatch queue closed, worker exiting");
    }

    fn transition(&mut self, next: WorkerState) {
        tracing::trace!(from = ?self.state, to = ?next, "Worker transition");
        self.state = next;
    }

    /// One full dispatch attempt. Failures drop the item; they never
    /// stall the pipeline or trigger a requeue.
    async fn process(&mut self, record: NormalizedRecord) {
        self.transition(WorkerState::ResolvingCredential);

        let (_credential, handle) = match self.provider.ensure_valid(&mut self.cache).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    message_id = %record.message_id,
                    "Dropping record, credential resolution failed"
                );
                metrics::counter!(RECORDS_DROPPED.name).increment(1);
                self.transition(WorkerState::Idle);
                return;
            }
        };

        let payload = match record.payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    message_id = %record.message_id,
                    "Dropping record, payload serialization failed"
                );
                metrics::counter!(RECORDS_DROPPED.name).increment(1);
                self.transition(WorkerState::Idle);
                return;
            }
        };

        self.transition(WorkerState::Submitting);
        let started = Instant::now();

        match handle.submit(&self.application_id, &payload).await {
            Ok(()) => {
                metrics::counter!(RECORDS_SUBMITTED.name).increment(1);
                metrics::histogram!(SUBMIT_DURATION.name)
                    .record(started.elapsed().as_secs_f64());
                tracing::debug!(
                    message_id = %record.message_id,
                    stream = %handle.stream_name(),
                    "Record submitted"
                );
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    message_id = %record.message_id,
                    "Dropping record, submission failed"
                );
                metrics::counter!(RECORDS_DROPPED.name).increment(1);
            }
        }

        self.transition(WorkerState::Idle);
    }
}
