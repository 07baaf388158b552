//! In-process fakes for the authority and destination seams, with
//! enough instrumentation to assert call counts, ordering and the
//! at-most-one-in-flight invariant.

use crate::authority::{AuthorityError, CredentialAuthority, StreamGrant};
use crate::destination::{DestinationBinder, DestinationClient, DestinationHandle, SubmitError};
use crate::record::{Identity, NormalizedRecord, RawEvent};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn record_named(event: &str) -> NormalizedRecord {
    let mut fields = Map::new();
    fields.insert("event".into(), Value::String(event.to_string()));

    NormalizedRecord::normalize(
        RawEvent { fields },
        Identity {
            user_id: "user-1".into(),
            anonymous_id: "anon-1".into(),
        },
        "app-1",
    )
}

pub fn null_handle() -> Arc<DestinationHandle> {
    Arc::new(DestinationHandle::new("events-test", Arc::new(NoopDestination)))
}

/// Tracks concurrent entries into a faked network call and remembers
/// the high-water mark.
#[derive(Default)]
struct InFlight {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(current, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

pub struct FakeAuthority {
    token: String,
    fetches: AtomicUsize,
    fail_first: usize,
    always_fail: bool,
    delay: Option<Duration>,
    in_flight: InFlight,
}

impl FakeAuthority {
    pub fn new(token: &str) -> Self {
        FakeAuthority {
            token: token.to_string(),
            fetches: AtomicUsize::new(0),
            fail_first: 0,
            always_fail: false,
            delay: None,
            in_flight: InFlight::default(),
        }
    }

    /// Fail the first `n` fetches with a 503, then succeed.
    pub fn fail_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn always_fail(mut self) -> Self {
        self.always_fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.in_flight.max()
    }
}

#[async_trait]
impl CredentialAuthority for FakeAuthority {
    async fn fetch(&self, _app_id: &str) -> Result<StreamGrant, AuthorityError> {
        self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let call = self.fetches.fetch_add(1, Ordering::SeqCst);
        self.in_flight.exit();

        if self.always_fail || call < self.fail_first {
            return Err(AuthorityError::BadStatus(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }

        Ok(StreamGrant {
            region: "us-test-1".into(),
            role_arn: "arn:aws:iam::000:role/test".into(),
            stream_name: "events-test".into(),
            token: self.token.clone(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct Put {
    pub stream_name: String,
    pub partition_key: String,
    pub payload: Vec<u8>,
}

pub struct RecordingDestination {
    puts: Mutex<Vec<Put>>,
    calls: AtomicUsize,
    fail_first: usize,
    fail_nth: Option<usize>,
    delay: Option<Duration>,
    in_flight: InFlight,
}

impl RecordingDestination {
    pub fn new() -> Self {
        RecordingDestination {
            puts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_first: 0,
            fail_nth: None,
            delay: None,
            in_flight: InFlight::default(),
        }
    }

    /// Fail the first `n` puts with a 400.
    pub fn fail_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Fail only the put with index `n` (zero-based).
    pub fn fail_nth(mut self, n: usize) -> Self {
        self.fail_nth = Some(n);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn puts(&self) -> Vec<Put> {
        self.puts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.in_flight.max()
    }
}

impl Default for RecordingDestination {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DestinationClient for RecordingDestination {
    async fn put(
        &self,
        stream_name: &str,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<(), SubmitError> {
        self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.exit();

        if call < self.fail_first || Some(call) == self.fail_nth {
            return Err(SubmitError::BadStatus(reqwest::StatusCode::BAD_REQUEST));
        }

        self.puts.lock().unwrap().push(Put {
            stream_name: stream_name.to_string(),
            partition_key: partition_key.to_string(),
            payload: payload.to_vec(),
        });

        Ok(())
    }
}

/// Binds every grant to a shared RecordingDestination so tests can
/// inspect what was submitted.
pub struct RecordingBinder {
    destination: Arc<RecordingDestination>,
}

impl RecordingBinder {
    pub fn new(destination: Arc<RecordingDestination>) -> Self {
        RecordingBinder { destination }
    }
}

impl DestinationBinder for RecordingBinder {
    fn bind(&self, grant: &StreamGrant) -> Arc<DestinationHandle> {
        Arc::new(DestinationHandle::new(
            &grant.stream_name,
            self.destination.clone(),
        ))
    }
}

/// Discards every put.
pub struct NoopDestination;

#[async_trait]
impl DestinationClient for NoopDestination {
    async fn put(&self, _: &str, _: &str, _: &[u8]) -> Result<(), SubmitError> {
        Ok(())
    }
}

pub struct NullBinder;

impl DestinationBinder for NullBinder {
    fn bind(&self, grant: &StreamGrant) -> Arc<DestinationHandle> {
        Arc::new(DestinationHandle::new(
            &grant.stream_name,
            Arc::new(NoopDestination),
        ))
    }
}
