use crate::metrics_defs::RECORDS_ENQUEUED;
use crate::record::NormalizedRecord;
use tokio::sync::mpsc;

#[derive(thiserror::Error, Debug)]
pub enum EnqueueError {
    #[error("dispatch queue is closed")]
    Closed,
}

/// Producer side of the dispatch queue. Clonable, push never blocks.
#[derive(Clone)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<NormalizedRecord>,
}

impl QueueSender {
    pub fn push(&self, record: NormalizedRecord) -> Result<(), EnqueueError> {
        self.tx.send(record).map_err(|_| EnqueueError::Closed)?;
        metrics::counter!(RECORDS_ENQUEUED.name).increment(1);
        Ok(())
    }
}

/// Worker side of the dispatch queue. pop is the worker's only
/// suspension point while idle.
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<NormalizedRecord>,
}

impl QueueReceiver {
    /// Returns None once all senders are dropped and the backlog is
    /// drained, which is the worker's shutdown signal.
    pub async fn pop(&mut self) -> Option<NormalizedRecord> {
        self.rx.recv().await
    }
}

pub fn dispatch_queue() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueSender { tx }, QueueReceiver { rx })
}
