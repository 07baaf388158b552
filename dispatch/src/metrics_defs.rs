//! Metrics definitions for the dispatch pipeline.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

pub const RECORDS_ENQUEUED: MetricDef = MetricDef {
    name: "dispatch.enqueued",
    metric_type: MetricType::Counter,
    description: "Records accepted onto the dispatch queue",
};

pub const RECORDS_SUBMITTED: MetricDef = MetricDef {
    name: "dispatch.submitted",
    metric_type: MetricType::Counter,
    description: "Records successfully put onto the destination stream",
};

pub const RECORDS_DROPPED: MetricDef = MetricDef {
    name: "dispatch.dropped",
    metric_type: MetricType::Counter,
    description: "Records dropped after a failed refresh or submission",
};

pub const CREDENTIAL_REFRESH: MetricDef = MetricDef {
    name: "credential.refresh",
    metric_type: MetricType::Counter,
    description: "Credential refresh round trips issued to the authority",
};

pub const CREDENTIAL_CACHE_HIT: MetricDef = MetricDef {
    name: "credential.cache_hit",
    metric_type: MetricType::Counter,
    description: "Dispatches served by the cached credential",
};

pub const SUBMIT_DURATION: MetricDef = MetricDef {
    name: "dispatch.submit.duration",
    metric_type: MetricType::Histogram,
    description: "Time to submit one record to the destination in seconds",
};

pub const REPLAY_FLUSHED: MetricDef = MetricDef {
    name: "replay.flushed",
    metric_type: MetricType::Counter,
    description: "Pre-init records flushed from the replay log",
};

// TODO: all metrics must be added here for now, this can be done dynamically with a macro in the future.
pub const ALL_METRICS: &[MetricDef] = &[
    RECORDS_ENQUEUED,
    RECORDS_SUBMITTED,
    RECORDS_DROPPED,
    CREDENTIAL_REFRESH,
    CREDENTIAL_CACHE_HIT,
    SUBMIT_DURATION,
    REPLAY_FLUSHED,
];
