use crate::Dispatcher;
use crate::metrics_defs::REPLAY_FLUSHED;
use crate::queue::EnqueueError;
use crate::record::{Identity, RawEvent};
use serde::Deserialize;
use std::io::BufRead;

/// One buffered pre-init call: identity fields plus the raw event.
#[derive(Debug, Deserialize)]
pub struct ReplayEntry {
    #[serde(flatten)]
    pub identity: Identity,
    #[serde(flatten)]
    pub event: RawEvent,
}

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error("could not read replay log: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed replay entry on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// Events buffered before the pipeline was initialized, in a JSON-lines
/// file. Loaded once at startup, flushed into the queue in original
/// order, then discarded. Normalization (messageId, sentAt) happens at
/// flush time, the same as for live pushes.
#[derive(Debug)]
pub struct ReplayLog {
    entries: Vec<ReplayEntry>,
}

impl ReplayLog {
    pub fn from_reader(reader: impl BufRead, capacity: Option<usize>) -> Result<Self, ReplayError> {
        let mut entries = Vec::new();
        let mut dropped = 0usize;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(cap) = capacity
                && entries.len() >= cap
            {
                dropped += 1;
                continue;
            }

            let entry: ReplayEntry = serde_json::from_str(&line)
                .map_err(|source| ReplayError::Parse {
                    line: index + 1,
                    source,
                })?;
            entries.push(entry);
        }

        if dropped > 0 {
            tracing::warn!(dropped, "Replay log exceeded capacity, newest entries dropped");
        }

        Ok(ReplayLog { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flushes every entry into the dispatcher in original order,
    /// consuming the log.
    pub fn flush_into(self, dispatcher: &Dispatcher) -> Result<usize, EnqueueError> {
        let mut flushed = 0usize;

        for entry in self.entries {
            dispatcher.enqueue_event(entry.event, entry.identity)?;
            flushed += 1;
        }

        metrics::counter!(REPLAY_FLUSHED.name).increment(flushed as u64);
        Ok(flushed)
    }
}
