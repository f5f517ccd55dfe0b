//! Metrics definitions for the metadata API.

use shared::metrics_defs::{MetricDef, MetricType};

pub const CACHE_HIT: MetricDef = MetricDef {
    name: "metadata.cache.hit",
    metric_type: MetricType::Counter,
    description: "Number of metadata requests served from the cache",
};

pub const CACHE_MISS: MetricDef = MetricDef {
    name: "metadata.cache.miss",
    metric_type: MetricType::Counter,
    description: "Number of metadata requests that missed the cache",
};

pub const FETCH_DURATION: MetricDef = MetricDef {
    name: "metadata.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch metadata from the source in seconds",
};

pub const TRIAGE_SUBMITTED: MetricDef = MetricDef {
    name: "triage.submitted",
    metric_type: MetricType::Counter,
    description: "Number of triage submissions accepted by the forge",
};

pub const TRIAGE_REJECTED: MetricDef = MetricDef {
    name: "triage.rejected",
    metric_type: MetricType::Counter,
    description: "Number of triage requests rejected before or during submission",
};

// TODO: all metrics must be added here for now, this can be done dynamically with a macro in the future.
pub const ALL_METRICS: &[MetricDef] = &[
    CACHE_HIT,
    CACHE_MISS,
    FETCH_DURATION,
    TRIAGE_SUBMITTED,
    TRIAGE_REJECTED,
];
