use crate::authority::AuthorityError;
use crate::credential::CacheError;
use crate::destination::SubmitError;
use thiserror::Error;

/// Per-item failures surfaced by the dispatch pipeline. None of these
/// are fatal: the item is dropped, the failure is logged and counted,
/// and the worker moves on to the next item.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Credential refresh failed (network error, timeout or non-2xx).
    /// Not retried; the next item re-checks validity and refreshes.
    #[error("credential refresh failed: {0}")]
    AuthorityUnreachable(#[from] AuthorityError),

    /// The destination rejected the record or the call errored.
    /// Intentional at-most-once delivery: no retry, no requeue.
    #[error("record submission failed: {0}")]
    SubmissionFailed(#[from] SubmitError),

    /// Cache read before any refresh. Unreachable through ensure_valid,
    /// which always refreshes before reading.
    #[error(transparent)]
    NotInitialized(#[from] CacheError),
}
